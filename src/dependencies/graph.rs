use std::collections::HashMap;

use async_recursion::async_recursion;
use tracing::{debug, trace, warn};

use crate::dependencies::descriptor::DescriptorFetcher;
use crate::dependencies::fetcher::ArtifactFetcher;
use crate::dependencies::flatten::is_preferred;
use crate::dependencies::version_resolver::{resolve_version, VersionResolver};
use crate::error::{DependencyError, DependencyResult};
use crate::maven::coordinates::{Coordinate, PackageIdentity};
use crate::properties::PropertyEnvironment;

/// Packages of the packaging toolchain itself. They are never resolved as project dependencies.
const EXCLUDED_PACKAGES: [(&str, &str); 3] = [
    ("com.vmware.pscoe.iac", "vrotsc"),
    ("com.vmware.pscoe.iac", "vropkg"),
    ("com.vmware.pscoe.iac", "vrotest"),
];

pub fn is_excluded(identity: &PackageIdentity) -> bool {
    EXCLUDED_PACKAGES.iter()
        .any(|(group_id, artifact_id)| identity.group_id.0 == *group_id && identity.artifact_id.0 == *artifact_id)
}

/// the fully resolved coordinate per package, for the duration of one resolution run. If a
///  package occurs in several versions, this holds the preferred one.
pub type VisitedSet = HashMap<PackageIdentity, Coordinate>;

/// Result of a resolution run. The caller owns it and can hand `visited` to a later run.
#[derive(Debug)]
pub struct ResolvedGraph {
    pub root: Coordinate,
    pub visited: VisitedSet,
}

/// Walks declared dependencies recursively, fetching descriptors and substituting properties.
///
/// Descriptor and snapshot lookups for anything but the root are best effort: failures are
///  logged and the subtree stays truncated. A package that depends on itself, directly or
///  transitively, fails the run.
pub struct DependencyGraphBuilder<'a> {
    descriptors: DescriptorFetcher<'a>,
    versions: VersionResolver<'a>,
    properties: &'a PropertyEnvironment,
    visited: VisitedSet,
    /// packages on the current recursion path, outermost first
    in_progress: Vec<PackageIdentity>,
}
impl<'a> DependencyGraphBuilder<'a> {
    pub fn new(artifacts: &'a ArtifactFetcher, properties: &'a PropertyEnvironment) -> DependencyGraphBuilder<'a> {
        DependencyGraphBuilder {
            descriptors: DescriptorFetcher::new(artifacts),
            versions: VersionResolver::new(artifacts),
            properties,
            visited: VisitedSet::new(),
            in_progress: vec![],
        }
    }

    pub fn with_visited(mut self, visited: VisitedSet) -> DependencyGraphBuilder<'a> {
        self.visited = visited;
        self
    }

    /// Resolves the dependencies the root declares itself, e.g. from a local project file.
    pub async fn resolve(mut self, mut root: Coordinate) -> DependencyResult<ResolvedGraph> {
        root.version = resolve_version(&root, self.properties)?;

        self.in_progress.push(root.identity());
        self.populate_dependencies(&mut root).await?;
        self.in_progress.pop();

        debug!("resolved {} with {} distinct packages", root, self.visited.len());
        Ok(ResolvedGraph {
            root,
            visited: self.visited,
        })
    }

    /// Resolves a root whose dependencies are declared in its descriptor in the repository.
    ///  Failing to fetch that descriptor is fatal.
    pub async fn resolve_remote(self, mut root: Coordinate) -> DependencyResult<ResolvedGraph> {
        root.version = resolve_version(&root, self.properties)?;
        self.apply_snapshot_name(&mut root).await;
        root.dependencies = self.descriptors.fetch_descriptor(&root).await?;
        self.resolve(root).await
    }

    #[async_recursion]
    async fn populate_dependencies(&mut self, coordinate: &mut Coordinate) -> DependencyResult<()> {
        let parent = coordinate.identity();
        coordinate.dependencies.retain(|child| {
            let excluded = is_excluded(&child.identity());
            if excluded {
                debug!("{}: skipping toolchain package {}", parent, child.identity());
            }
            !excluded
        });

        for child in coordinate.dependencies.iter_mut() {
            let identity = child.identity();

            if self.in_progress.contains(&identity) {
                let mut chain: Vec<String> = self.in_progress.iter()
                    .map(|i| i.to_string())
                    .collect();
                chain.push(identity.to_string());
                return Err(DependencyError::CyclicDependency { chain });
            }

            match resolve_version(child, self.properties) {
                Ok(version) => child.version = version,
                Err(e) => {
                    warn!("{} - leaving it unresolved", e);
                    continue;
                }
            }

            // only the same version is taken over, other versions are resolved on their own
            if let Some(resolved) = self.visited.get(&identity) {
                if resolved.version == child.version {
                    trace!("{} already resolved as {}", identity, resolved);
                    child.adopt(resolved);
                    continue;
                }
                debug!("{} is required in versions {} and {}", identity, resolved.version, child.version);
            }

            self.apply_snapshot_name(child).await;

            match self.descriptors.fetch_descriptor(child).await {
                Ok(dependencies) => child.dependencies = dependencies,
                Err(e) => {
                    warn!("{} - not resolving its dependencies", e);
                    child.dependencies = vec![];
                }
            }

            self.in_progress.push(identity.clone());
            self.populate_dependencies(child).await?;
            self.in_progress.pop();

            let preferred = match self.visited.get(&identity) {
                Some(existing) => is_preferred(&child.version, &existing.version),
                None => true,
            };
            if preferred {
                self.visited.insert(identity, child.clone());
            }
        }
        Ok(())
    }

    async fn apply_snapshot_name(&self, coordinate: &mut Coordinate) {
        if !coordinate.version.is_snapshot() {
            return;
        }
        match self.versions.resolve_snapshot_name(coordinate).await {
            Ok(name) => coordinate.name_override = Some(name),
            Err(e) => warn!("{} - using the plain snapshot name", e),
        }
    }
}
