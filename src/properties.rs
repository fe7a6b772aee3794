use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

/// build configuration files holding JVM-style "-Dkey=value" properties, relative to a directory
const PROPERTY_FILES: [&str; 2] = [".mvn/jvm.config", ".mvn/maven.config"];
const PROPERTY_MARKER: &str = "-D";
/// how many ancestors of the start directory are scanned in addition to it
const MAX_ANCESTORS: usize = 2;

/// Property values available for `${...}` substitution in versions. Read-only once assembled.
#[derive(Debug, Default, Clone)]
pub struct PropertyEnvironment {
    properties: HashMap<String, String>,
}
impl PropertyEnvironment {
    pub fn new(properties: HashMap<String, String>) -> PropertyEnvironment {
        PropertyEnvironment { properties }
    }

    /// Scans `start` and up to two of its ancestors. A key found in a directory closer to `start`
    ///  is never overwritten by one further up.
    pub async fn discover(start: &Path) -> anyhow::Result<PropertyEnvironment> {
        let mut properties = HashMap::new();

        for dir in start.ancestors().take(MAX_ANCESTORS + 1) {
            for file in PROPERTY_FILES {
                let path: PathBuf = dir.join(file);
                let content = match tokio::fs::read_to_string(&path).await {
                    Ok(content) => content,
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => return Err(anyhow::Error::new(e).context(format!("reading {}", path.display()))),
                };

                trace!("reading properties from {}", path.display());
                for (key, value) in parse_property_tokens(&content) {
                    properties.entry(key).or_insert(value);
                }
            }
        }

        debug!("discovered {} properties from {}", properties.len(), start.display());
        Ok(PropertyEnvironment { properties })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|v| v.as_str())
    }
}

/// extracts `-Dkey=value` tokens; the first occurrence of a key wins
fn parse_property_tokens(content: &str) -> Vec<(String, String)> {
    let mut result: Vec<(String, String)> = Vec::new();
    for token in content.split_whitespace() {
        let Some(definition) = token.strip_prefix(PROPERTY_MARKER) else {
            continue;
        };
        let Some((key, value)) = definition.split_once('=') else {
            continue;
        };
        if key.is_empty() || result.iter().any(|(k, _)| k == key) {
            continue;
        }
        result.push((key.to_string(), value.trim_matches('"').to_string()));
    }
    result
}
