use anyhow::anyhow;
use lazy_static::lazy_static;
use regex::Regex;

use crate::maven::coordinates::*;

lazy_static! {
    static ref SNAPSHOT_QUALIFIER_REGEX: Regex = Regex::new(r"^(\d{8}\.\d{6})-(\d+)$").unwrap();
}

pub const METADATA_FILE_NAME: &str = "maven-metadata.xml";

/// relative path inside a Maven repository, e.g. "com/acme/lib/1.0.0/lib-1.0.0.package"
pub fn as_maven_path(coordinate: &Coordinate) -> String {
    format!(
        "{}/{}/{}/{}",
        coordinate.group_id.0.replace('.', "/"),
        coordinate.artifact_id.0,
        coordinate.version.0,
        maven_file_name(coordinate),
    )
}

/// `<artifactId>-<version>[-<classifier>].<extension>`, with the stem replaced by the
///  coordinate's name override if there is one
pub fn maven_file_name(coordinate: &Coordinate) -> String {
    if coordinate.artifact_type == ArtifactType::Metadata {
        return METADATA_FILE_NAME.to_string();
    }

    let stem = match &coordinate.name_override {
        Some(name) => name.clone(),
        None => format!("{}-{}", coordinate.artifact_id.0, coordinate.version.0),
    };
    let classifier_string = match &coordinate.classifier {
        None => "".to_string(),
        Some(c) => format!("-{}", c),
    };

    format!("{}{}.{}", stem, classifier_string, coordinate.artifact_type.as_str())
}

#[derive(Debug, Eq, PartialEq, PartialOrd, Ord, Clone)]
pub struct SnapshotQualifier {
    pub timestamp: String,
    pub build_number: u32,
}

/// Parses the value of a snapshot entry in maven-metadata.xml, e.g. "1.0.0-20240101.120000-3"
///  for version "1.0.0-SNAPSHOT".
pub fn parse_snapshot_value(value: &str, version: &MavenVersion) -> anyhow::Result<SnapshotQualifier> {
    if !version.is_snapshot() {
        return Err(anyhow!("{} is not a snapshot version", version));
    }

    let base_version = version.base_version();
    let qualifier = value.strip_prefix(base_version)
        .and_then(|rest| rest.strip_prefix('-'))
        .ok_or_else(|| anyhow!("{} is not a build of version {}", value, version))?;

    match SNAPSHOT_QUALIFIER_REGEX.captures(qualifier) {
        Some(captures) => Ok(SnapshotQualifier {
            timestamp: captures[1].to_string(),
            build_number: captures[2].parse()?,
        }),
        None => Err(anyhow!("snapshot value without timestamp and build number: {}", value)),
    }
}
