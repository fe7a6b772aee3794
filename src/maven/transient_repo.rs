use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;

use crate::maven::coordinates::{ArtifactType, Coordinate};
use crate::maven::paths::as_maven_path;
use crate::maven::remote_repo::MavenRepository;
use crate::util::blob::Blob;

/// in-memory Maven repository that records every request - for testing purposes
#[derive(Clone, Default)]
pub struct TransientMavenRepo {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}
impl TransientMavenRepo {
    pub fn new() -> TransientMavenRepo {
        Default::default()
    }

    pub fn put(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.data.lock()
            .unwrap()
            .insert(path.to_string(), data.into());
    }

    pub fn put_artifact(&self, coordinate: &Coordinate, data: impl Into<Vec<u8>>) {
        self.put(&as_maven_path(coordinate), data);
    }

    /// Publishes a POM for the coordinate declaring the given dependencies.
    pub fn put_descriptor(&self, coordinate: &Coordinate, dependencies: &[Coordinate]) {
        let dependencies_xml: String = dependencies.iter()
            .map(|d| format!(
                "<dependency><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version><type>{}</type></dependency>",
                d.group_id.0, d.artifact_id.0, d.version.0, d.artifact_type.as_str()
            ))
            .collect();
        let xml = format!(
            "<project><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version><dependencies>{}</dependencies></project>",
            coordinate.group_id.0, coordinate.artifact_id.0, coordinate.version.0, dependencies_xml
        );
        self.put_artifact(&coordinate.with_type(ArtifactType::Pom), xml);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.requests.lock().unwrap()
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }
}

#[async_trait]
impl MavenRepository for TransientMavenRepo {
    fn url_for(&self, path: &str) -> String {
        format!("transient:///{}", path)
    }

    async fn get(&self, path: &str) -> anyhow::Result<Blob> {
        self.requests.lock().unwrap().push(path.to_string());

        let data = self.data.lock().unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("GET {} failed: 404 Not Found", self.url_for(path)))?;

        let content_length = Some(data.len() as u64);
        let bytes = Bytes::from(data);
        let stream = futures::stream::once(async move { Ok::<_, anyhow::Error>(bytes) });
        Ok(Blob {
            data: Box::pin(stream),
            content_length,
        })
    }
}
