#![allow(non_snake_case)]

use serde::Deserialize;

use crate::maven::coordinates::MavenVersion;
use crate::maven::paths::{parse_snapshot_value, SnapshotQualifier};

/// maven-metadata.xml, see https://maven.apache.org/ref/3.9.5/maven-repository-metadata/repository-metadata.html
///
/// Only the parts needed for snapshot resolution are typed. Everything is optional because the
///  file looks different on group, artifact and version level.
#[derive(Debug, Default, Deserialize)]
pub struct Metadata {
    pub groupId: Option<String>,
    pub artifactId: Option<String>,
    pub version: Option<String>,
    pub versioning: Option<Versioning>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Versioning {
    pub latest: Option<String>,
    pub release: Option<String>,
    pub versions: Option<Versions>,
    pub lastUpdated: Option<String>,
    pub snapshot: Option<Snapshot>,
    pub snapshotVersions: Option<SnapshotVersions>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Versions {
    #[serde(default)]
    pub version: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    pub timestamp: Option<String>,
    pub buildNumber: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SnapshotVersions {
    #[serde(default)]
    pub snapshotVersion: Vec<SnapshotVersion>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SnapshotVersion {
    pub classifier: Option<String>,
    pub extension: String,
    pub value: String,
    pub updated: Option<String>,
}

impl Metadata {
    pub fn parse(xml: &str) -> anyhow::Result<Metadata> {
        Ok(serde_xml_rs::from_str(xml)?)
    }

    /// The newest build-qualified value (e.g. "1.0.0-20240101.120000-3") among unclassified
    ///  snapshot entries with the given extension. Entries without a build qualifier are ignored.
    pub fn latest_snapshot_value(&self, version: &MavenVersion, extension: &str) -> Option<&str> {
        let snapshot_versions = self.versioning.as_ref()?
            .snapshotVersions.as_ref()?;

        snapshot_versions.snapshotVersion.iter()
            .filter(|v| v.extension == extension && v.classifier.as_deref().unwrap_or("").is_empty())
            .filter_map(|v| {
                let qualifier: SnapshotQualifier = parse_snapshot_value(&v.value, version).ok()?;
                Some((qualifier, v.value.as_str()))
            })
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, value)| value)
    }
}
