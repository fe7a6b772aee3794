pub mod descriptor;
pub mod fetcher;
pub mod flatten;
pub mod graph;
pub mod handlers;
pub mod version_resolver;

use std::path::PathBuf;

use tracing::info;

use crate::dependencies::fetcher::ArtifactFetcher;
use crate::dependencies::flatten::{flatten, FlatDependencyMap};
use crate::dependencies::graph::{DependencyGraphBuilder, ResolvedGraph};
use crate::dependencies::handlers::TypeHandlers;
use crate::error::DependencyResult;
use crate::maven::coordinates::Coordinate;
use crate::properties::PropertyEnvironment;

/// Where the root's direct dependencies come from.
#[derive(Debug, Clone)]
pub enum RootCoordinate {
    /// declared locally, e.g. read from the project's pom.xml
    Local(Coordinate),
    /// declared in the root's descriptor in the repository
    Remote(Coordinate),
}

#[derive(Debug)]
pub struct FetchSummary {
    pub root: Coordinate,
    pub dependencies: FlatDependencyMap,
    /// artifacts and the locations their type handler placed them at
    pub placed: Vec<(Coordinate, PathBuf)>,
}

pub async fn resolve(fetcher: &ArtifactFetcher, properties: &PropertyEnvironment, root: RootCoordinate) -> DependencyResult<ResolvedGraph> {
    let builder = DependencyGraphBuilder::new(fetcher, properties);
    match root {
        RootCoordinate::Local(root) => builder.resolve(root).await,
        RootCoordinate::Remote(root) => builder.resolve_remote(root).await,
    }
}

/// The whole pipeline: resolve the graph, flatten it, download every artifact and hand each to
///  its type handler.
pub async fn fetch_dependencies(
    fetcher: &ArtifactFetcher,
    handlers: &TypeHandlers,
    properties: &PropertyEnvironment,
    root: RootCoordinate,
    concurrency: usize,
) -> DependencyResult<FetchSummary> {
    let graph = resolve(fetcher, properties, root).await?;
    let dependencies = flatten(&graph.root);
    info!("{} resolves to {} packages", graph.root, dependencies.len());

    let fetched = fetcher.fetch_all(&dependencies, concurrency).await?;

    let mut placed = Vec::new();
    for (coordinate, path) in fetched {
        if let Some(location) = handlers.handle(&coordinate, &path).await? {
            placed.push((coordinate, location));
        }
    }

    Ok(FetchSummary {
        root: graph.root,
        dependencies,
        placed,
    })
}
