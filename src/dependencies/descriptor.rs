use tracing::{debug, warn};

use crate::dependencies::fetcher::ArtifactFetcher;
use crate::error::{DependencyError, DependencyResult};
use crate::maven::coordinates::{ArtifactType, Coordinate};
use crate::maven::descriptor_xml::ProjectDescriptor;

pub struct DescriptorFetcher<'a> {
    artifacts: &'a ArtifactFetcher,
}
impl<'a> DescriptorFetcher<'a> {
    pub fn new(artifacts: &'a ArtifactFetcher) -> DescriptorFetcher<'a> {
        DescriptorFetcher { artifacts }
    }

    /// Fetches the coordinate's descriptor and returns the dependencies it declares. Test-scoped
    ///  dependencies and dependencies without any known version are dropped.
    pub async fn fetch_descriptor(&self, coordinate: &Coordinate) -> DependencyResult<Vec<Coordinate>> {
        let descriptor_error = |reason: String| DependencyError::DescriptorFetch {
            coordinate: coordinate.to_string(),
            reason,
        };

        if coordinate.version.is_placeholder() {
            return Err(descriptor_error(format!("version {} is not resolved", coordinate.version)));
        }

        let path = self.artifacts.fetch_artifact(&coordinate.with_type(ArtifactType::Pom), None)
            .await
            .map_err(|e| descriptor_error(e.to_string()))?;
        let xml = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| descriptor_error(format!("reading {}: {}", path.display(), e)))?;
        let descriptor = ProjectDescriptor::parse(&xml)
            .map_err(|e| descriptor_error(format!("invalid descriptor {}: {:#}", path.display(), e)))?;

        Ok(child_coordinates(coordinate, &descriptor))
    }
}

pub fn child_coordinates(coordinate: &Coordinate, descriptor: &ProjectDescriptor) -> Vec<Coordinate> {
    let mut result = Vec::new();
    for declared in descriptor.declared_dependencies() {
        if declared.is_test_scoped() {
            debug!("{}: ignoring test dependency {}:{}", coordinate, declared.group_id, declared.artifact_id);
            continue;
        }
        match descriptor.child_coordinate(declared) {
            Some(child) => result.push(child),
            None => warn!("{}: no version declared for dependency {}:{}, skipping", coordinate, declared.group_id, declared.artifact_id),
        }
    }
    result
}
