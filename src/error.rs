use std::path::PathBuf;

use thiserror::Error;

/// Failures of the dependency resolution and fetch pipeline.
///
/// Which of these are fatal is decided by the caller: the graph builder recovers from descriptor
///  and snapshot lookups for non-root coordinates, everything else aborts the run.
#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("failed to fetch descriptor for {coordinate}: {reason}")]
    DescriptorFetch {
        coordinate: String,
        reason: String,
    },

    #[error("version '{version}' of {coordinate} references undefined property '{property}'")]
    UnresolvedProperty {
        coordinate: String,
        version: String,
        property: String,
    },

    #[error("no snapshot version found for {coordinate}: {reason}")]
    NoSnapshotVersion {
        coordinate: String,
        reason: String,
    },

    #[error("failed to download {coordinate} from {url}: {reason}")]
    ArtifactDownload {
        coordinate: String,
        url: String,
        reason: String,
    },

    #[error("failed to extract {archive:?} into {destination:?}: {reason}")]
    Extraction {
        archive: PathBuf,
        destination: PathBuf,
        reason: String,
    },

    #[error("cyclic dependency: {}", .chain.join(" -> "))]
    CyclicDependency {
        chain: Vec<String>,
    },

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type DependencyResult<T> = Result<T, DependencyError>;

impl DependencyError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> DependencyError {
        DependencyError::Io {
            path: path.into(),
            source,
        }
    }
}
