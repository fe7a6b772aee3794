use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::dependencies::fetcher::ArtifactFetcher;
use crate::error::{DependencyError, DependencyResult};
use crate::maven::coordinates::{ArtifactType, Coordinate, MavenVersion};
use crate::maven::metadata_xml::Metadata;
use crate::properties::PropertyEnvironment;

lazy_static! {
    static ref PLACEHOLDER_REGEX: Regex = Regex::new(r"\$\{([^}]+)\}").unwrap();
}

/// Substitutes every `${key}` in the coordinate's version from the property environment.
pub fn resolve_version(coordinate: &Coordinate, properties: &PropertyEnvironment) -> DependencyResult<MavenVersion> {
    let version = &coordinate.version.0;
    let mut result = String::with_capacity(version.len());
    let mut last_end = 0;

    for captures in PLACEHOLDER_REGEX.captures_iter(version) {
        let (Some(placeholder), Some(key)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let value = properties.get(key.as_str())
            .ok_or_else(|| DependencyError::UnresolvedProperty {
                coordinate: coordinate.to_string(),
                version: version.clone(),
                property: key.as_str().to_string(),
            })?;

        result.push_str(&version[last_end..placeholder.start()]);
        result.push_str(value);
        last_end = placeholder.end();
    }
    result.push_str(&version[last_end..]);

    if result != *version {
        trace!("resolved version {} of {} to {}", version, coordinate.identity(), result);
    }
    Ok(MavenVersion(result))
}

/// Looks up build-qualified file names of snapshots in repository metadata.
pub struct VersionResolver<'a> {
    artifacts: &'a ArtifactFetcher,
}
impl<'a> VersionResolver<'a> {
    pub fn new(artifacts: &'a ArtifactFetcher) -> VersionResolver<'a> {
        VersionResolver { artifacts }
    }

    /// The file name stem to fetch the coordinate by. That is "<artifactId>-<version>" for
    ///  releases, and the newest build with a descriptor (e.g. "lib-1.0.0-20240101.120000-3") for
    ///  snapshots.
    pub async fn resolve_snapshot_name(&self, coordinate: &Coordinate) -> DependencyResult<String> {
        if !coordinate.version.is_snapshot() {
            return Ok(format!("{}-{}", coordinate.artifact_id.0, coordinate.version.0));
        }

        let no_snapshot = |reason: String| DependencyError::NoSnapshotVersion {
            coordinate: coordinate.to_string(),
            reason,
        };

        let metadata_path = self.artifacts.fetch_artifact(&coordinate.with_type(ArtifactType::Metadata), None)
            .await
            .map_err(|e| no_snapshot(e.to_string()))?;
        let xml = tokio::fs::read_to_string(&metadata_path)
            .await
            .map_err(|e| no_snapshot(format!("reading {}: {}", metadata_path.display(), e)))?;
        let metadata = Metadata::parse(&xml)
            .map_err(|e| no_snapshot(format!("invalid metadata: {:#}", e)))?;

        let value = metadata.latest_snapshot_value(&coordinate.version, ArtifactType::Pom.as_str())
            .ok_or_else(|| no_snapshot("metadata lists no build with a descriptor".to_string()))?;
        Ok(format!("{}-{}", coordinate.artifact_id.0, value))
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::sync::Arc;

    use rstest::*;
    use super::*;
    use crate::cache::fs_artifact_cache::FsArtifactCache;
    use crate::maven::transient_repo::TransientMavenRepo;

    fn properties() -> PropertyEnvironment {
        PropertyEnvironment::new(HashMap::from([
            ("lib.version".to_string(), "2.1.0".to_string()),
            ("major".to_string(), "3".to_string()),
            ("minor".to_string(), "4".to_string()),
        ]))
    }

    #[rstest]
    #[case::literal("1.0.0", "1.0.0")]
    #[case::placeholder("${lib.version}", "2.1.0")]
    #[case::embedded("${major}.${minor}.0", "3.4.0")]
    #[case::snapshot("${major}.0-SNAPSHOT", "3.0-SNAPSHOT")]
    fn test_resolve_version(#[case] version: &str, #[case] expected: &str) {
        let coordinate = Coordinate::new("com.acme", "lib", version);
        assert_eq!(resolve_version(&coordinate, &properties()).unwrap().0, expected);
    }

    #[test]
    fn test_resolve_version_with_undefined_property() {
        let coordinate = Coordinate::new("com.acme", "lib", "${undefined.version}");
        match resolve_version(&coordinate, &properties()) {
            Err(DependencyError::UnresolvedProperty { property, version, .. }) => {
                assert_eq!(property, "undefined.version");
                assert_eq!(version, "${undefined.version}");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    const METADATA: &str = r#"<metadata>
  <versioning>
    <snapshotVersions>
      <snapshotVersion>
        <extension>pom</extension>
        <value>1.0.0-20240101.120000-3</value>
      </snapshotVersion>
      <snapshotVersion>
        <extension>pom</extension>
        <value>1.0.0-20240105.090000-7</value>
      </snapshotVersion>
    </snapshotVersions>
  </versioning>
</metadata>"#;

    fn fetcher(repo: &TransientMavenRepo, dir: &std::path::Path) -> ArtifactFetcher {
        ArtifactFetcher::new(Arc::new(repo.clone()), FsArtifactCache::new(dir), true)
    }

    #[tokio::test]
    async fn test_release_name_needs_no_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let repo = TransientMavenRepo::new();
        let fetcher = fetcher(&repo, dir.path());

        let name = VersionResolver::new(&fetcher)
            .resolve_snapshot_name(&Coordinate::new("com.acme", "lib", "1.0.0"))
            .await
            .unwrap();

        assert_eq!(name, "lib-1.0.0");
        assert!(repo.requests().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_name_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let repo = TransientMavenRepo::new();
        repo.put("com/acme/lib/1.0.0-SNAPSHOT/maven-metadata.xml", METADATA);
        let fetcher = fetcher(&repo, dir.path());

        let name = VersionResolver::new(&fetcher)
            .resolve_snapshot_name(&Coordinate::new("com.acme", "lib", "1.0.0-SNAPSHOT"))
            .await
            .unwrap();

        assert_eq!(name, "lib-1.0.0-20240105.090000-7");
    }

    #[tokio::test]
    async fn test_snapshot_without_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let repo = TransientMavenRepo::new();
        let fetcher = fetcher(&repo, dir.path());

        let result = VersionResolver::new(&fetcher)
            .resolve_snapshot_name(&Coordinate::new("com.acme", "lib", "1.0.0-SNAPSHOT"))
            .await;

        assert!(matches!(result, Err(DependencyError::NoSnapshotVersion { .. })));
    }

    #[tokio::test]
    async fn test_snapshot_without_descriptor_build() {
        let dir = tempfile::tempdir().unwrap();
        let repo = TransientMavenRepo::new();
        repo.put("com/acme/lib/1.0.0-SNAPSHOT/maven-metadata.xml", "<metadata><versioning><lastUpdated>1</lastUpdated></versioning></metadata>");
        let fetcher = fetcher(&repo, dir.path());

        let result = VersionResolver::new(&fetcher)
            .resolve_snapshot_name(&Coordinate::new("com.acme", "lib", "1.0.0-SNAPSHOT"))
            .await;

        assert!(matches!(result, Err(DependencyError::NoSnapshotVersion { .. })));
    }

    #[tokio::test]
    async fn test_unreadable_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let repo = TransientMavenRepo::new();
        repo.put("com/acme/lib/1.0.0-SNAPSHOT/maven-metadata.xml", vec![0xff, 0xfe, 0x00]);
        let fetcher = fetcher(&repo, dir.path());

        let result = VersionResolver::new(&fetcher)
            .resolve_snapshot_name(&Coordinate::new("com.acme", "lib", "1.0.0-SNAPSHOT"))
            .await;

        assert!(matches!(result, Err(DependencyError::NoSnapshotVersion { .. })));
    }
}
