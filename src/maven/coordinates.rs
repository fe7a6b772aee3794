use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MavenGroupId(pub String);

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MavenArtifactId(pub String);

/// A version string as declared, possibly still containing `${property}` placeholders.
///
/// NB: ordering is plain string ordering, so "1.9.0" > "1.10.0". Dependency flattening relies on
///  exactly this ordering.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MavenVersion(pub String);
impl MavenVersion {
    pub fn is_snapshot(&self) -> bool {
        self.0.ends_with("-SNAPSHOT")
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.contains("${")
    }

    /// the version without its "-SNAPSHOT" suffix
    pub fn base_version(&self) -> &str {
        self.0.strip_suffix("-SNAPSHOT").unwrap_or(&self.0)
    }
}
impl Display for MavenVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArtifactType {
    /// a packaged build output - an opaque single file
    #[default]
    Package,
    /// a gzipped tarball of type definitions
    Tgz,
    /// the descriptor (POM)
    Pom,
    /// repository metadata (maven-metadata.xml)
    Metadata,
    Other(String),
}
impl ArtifactType {
    pub fn as_str(&self) -> &str {
        match self {
            ArtifactType::Package => "package",
            ArtifactType::Tgz => "tgz",
            ArtifactType::Pom => "pom",
            ArtifactType::Metadata => "metadata",
            ArtifactType::Other(s) => s,
        }
    }
}
impl From<&str> for ArtifactType {
    fn from(value: &str) -> Self {
        match value {
            "" | "package" => ArtifactType::Package,
            "tgz" => ArtifactType::Tgz,
            "pom" => ArtifactType::Pom,
            "metadata" => ArtifactType::Metadata,
            other => ArtifactType::Other(other.to_string()),
        }
    }
}
impl From<String> for ArtifactType {
    fn from(value: String) -> Self {
        ArtifactType::from(value.as_str())
    }
}
impl From<ArtifactType> for String {
    fn from(value: ArtifactType) -> Self {
        value.as_str().to_string()
    }
}

/// (groupId, artifactId) - identifies a package independently of its version
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug)]
pub struct PackageIdentity {
    pub group_id: MavenGroupId,
    pub artifact_id: MavenArtifactId,
}
impl PackageIdentity {
    pub fn new(group_id: &str, artifact_id: &str) -> PackageIdentity {
        PackageIdentity {
            group_id: MavenGroupId(group_id.to_string()),
            artifact_id: MavenArtifactId(artifact_id.to_string()),
        }
    }
}
impl Display for PackageIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.group_id.0, self.artifact_id.0)
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub group_id: MavenGroupId,
    pub artifact_id: MavenArtifactId,
    pub version: MavenVersion,
    #[serde(rename = "type", default)]
    pub artifact_type: ArtifactType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    /// replaces the "<artifactId>-<version>" file name stem, e.g. for timestamped snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_override: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Coordinate>,
}
impl Coordinate {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Coordinate {
        Coordinate {
            group_id: MavenGroupId(group_id.to_string()),
            artifact_id: MavenArtifactId(artifact_id.to_string()),
            version: MavenVersion(version.to_string()),
            artifact_type: ArtifactType::Package,
            classifier: None,
            name_override: None,
            dependencies: vec![],
        }
    }

    pub fn with_type(&self, artifact_type: ArtifactType) -> Coordinate {
        Coordinate {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: self.version.clone(),
            artifact_type,
            classifier: self.classifier.clone(),
            name_override: self.name_override.clone(),
            dependencies: vec![],
        }
    }

    pub fn identity(&self) -> PackageIdentity {
        PackageIdentity {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
        }
    }

    /// Takes over everything resolution produced for the same package elsewhere in the graph.
    pub fn adopt(&mut self, resolved: &Coordinate) {
        self.version = resolved.version.clone();
        self.name_override = resolved.name_override.clone();
        self.artifact_type = resolved.artifact_type.clone();
        self.dependencies = resolved.dependencies.clone();
    }

    /// a copy without nested dependencies
    pub fn leaf(&self) -> Coordinate {
        self.with_type(self.artifact_type.clone())
    }
}
impl Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group_id.0, self.artifact_id.0, self.version.0)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        write!(f, "@{}", self.artifact_type.as_str())
    }
}

/// `groupId:artifactId:version[:classifier][@type]`
impl FromStr for Coordinate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (coordinate_part, artifact_type) = match s.rsplit_once('@') {
            Some((c, t)) => (c, ArtifactType::from(t)),
            None => (s, ArtifactType::Package),
        };

        let parts: Vec<&str> = coordinate_part.split(':').collect();
        if parts.len() < 3 || parts.len() > 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(anyhow!("not a valid Maven coordinate: {:?}", s));
        }

        let mut result = Coordinate::new(parts[0], parts[1], parts[2]);
        result.artifact_type = artifact_type;
        result.classifier = parts.get(3).map(|c| c.to_string());
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use rstest::*;
    use super::*;

    #[rstest]
    #[case::plain("com.acme:app:1.0.0", "com.acme", "app", "1.0.0", None, ArtifactType::Package)]
    #[case::typed("com.acme:types:2.0@tgz", "com.acme", "types", "2.0", None, ArtifactType::Tgz)]
    #[case::classified("com.acme:app:1.0:sources@jar", "com.acme", "app", "1.0", Some("sources"), ArtifactType::Other("jar".to_string()))]
    #[case::snapshot("a.b:c:1.0.0-SNAPSHOT", "a.b", "c", "1.0.0-SNAPSHOT", None, ArtifactType::Package)]
    fn test_parse_coordinate(
        #[case] s: &str,
        #[case] group_id: &str,
        #[case] artifact_id: &str,
        #[case] version: &str,
        #[case] classifier: Option<&str>,
        #[case] artifact_type: ArtifactType,
    ) {
        let parsed: Coordinate = s.parse().unwrap();
        assert_eq!(parsed.group_id.0, group_id);
        assert_eq!(parsed.artifact_id.0, artifact_id);
        assert_eq!(parsed.version.0, version);
        assert_eq!(parsed.classifier.as_deref(), classifier);
        assert_eq!(parsed.artifact_type, artifact_type);
    }

    #[rstest]
    #[case::too_short("com.acme:app")]
    #[case::too_long("a:b:c:d:e")]
    #[case::empty_segment("a::1.0")]
    #[case::empty("")]
    fn test_parse_invalid_coordinate(#[case] s: &str) {
        assert!(s.parse::<Coordinate>().is_err());
    }

    #[test]
    fn test_identity_display() {
        let coordinate = Coordinate::new("com.acme", "lib", "2.1.0");
        assert_eq!(coordinate.identity().to_string(), "com.acme.lib");
        assert_eq!(coordinate.to_string(), "com.acme:lib:2.1.0@package");
    }

    #[rstest]
    #[case::release("1.0.0", false, false)]
    #[case::snapshot("1.0.0-SNAPSHOT", true, false)]
    #[case::lowercase_snapshot("1.0.0-snapshot", false, false)]
    #[case::placeholder("${lib.version}", false, true)]
    #[case::embedded_placeholder("1.${minor}", false, true)]
    fn test_version_kinds(#[case] version: &str, #[case] is_snapshot: bool, #[case] is_placeholder: bool) {
        let version = MavenVersion(version.to_string());
        assert_eq!(version.is_snapshot(), is_snapshot);
        assert_eq!(version.is_placeholder(), is_placeholder);
    }

    #[test]
    fn test_version_ordering_is_lexicographic() {
        assert!(MavenVersion("1.9.0".to_string()) > MavenVersion("1.10.0".to_string()));
        assert!(MavenVersion("2.1.0".to_string()) > MavenVersion("2.0.9".to_string()));
    }

    #[test]
    fn test_lock_file_json_shape() {
        let json = r#"{
            "groupId": "com.acme",
            "artifactId": "app",
            "version": "1.0.0",
            "dependencies": [
                { "groupId": "com.acme", "artifactId": "types", "version": "1.0.0", "type": "tgz" }
            ]
        }"#;

        let parsed: Coordinate = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.artifact_type, ArtifactType::Package);
        assert_eq!(parsed.dependencies.len(), 1);
        assert_eq!(parsed.dependencies[0].artifact_type, ArtifactType::Tgz);
        assert!(parsed.dependencies[0].dependencies.is_empty());
    }
}
