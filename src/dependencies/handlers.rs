use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, error, info, trace};
use uuid::Uuid;

use crate::error::{DependencyError, DependencyResult};
use crate::maven::coordinates::{ArtifactType, Coordinate};
use crate::maven::paths::maven_file_name;

/// top-level directory npm-style archives wrap their content in
const WRAPPER_DIR: &str = "package";

/// Post-processing of downloaded artifacts, by artifact type.
pub struct TypeHandlers {
    types_dir: PathBuf,
    dependencies_dir: PathBuf,
    /// directory names for well-known type bundles, keyed by "<groupId>.<artifactId>"
    bundle_names: HashMap<String, String>,
}
impl TypeHandlers {
    pub fn new(types_dir: impl Into<PathBuf>, dependencies_dir: impl Into<PathBuf>, bundle_names: HashMap<String, String>) -> TypeHandlers {
        TypeHandlers {
            types_dir: types_dir.into(),
            dependencies_dir: dependencies_dir.into(),
            bundle_names,
        }
    }

    /// where a type-definition bundle is extracted to
    pub fn types_destination(&self, coordinate: &Coordinate) -> PathBuf {
        let identity = coordinate.identity().to_string();
        match self.bundle_names.get(&identity) {
            Some(name) => self.types_dir.join(name),
            None => self.types_dir.join(identity),
        }
    }

    /// Places the downloaded artifact where its consumers expect it. Returns the resulting
    ///  location, or `None` for types that need no post-processing.
    pub async fn handle(&self, coordinate: &Coordinate, artifact: &Path) -> DependencyResult<Option<PathBuf>> {
        match coordinate.artifact_type {
            ArtifactType::Tgz => self.extract_types(coordinate, artifact).await.map(Some),
            ArtifactType::Package => self.copy_package(coordinate, artifact).await.map(Some),
            _ => {
                debug!("no post-processing for {}", coordinate);
                Ok(None)
            }
        }
    }

    async fn extract_types(&self, coordinate: &Coordinate, artifact: &Path) -> DependencyResult<PathBuf> {
        let destination = self.types_destination(coordinate);

        let exists = tokio::fs::try_exists(&destination)
            .await
            .map_err(|e| DependencyError::io(&destination, e))?;
        if exists {
            debug!("{} is already extracted to {}", coordinate, destination.display());
            return Ok(destination);
        }

        info!("extracting {} to {}", coordinate, destination.display());
        let archive = artifact.to_path_buf();
        let target = destination.clone();
        let extracted = tokio::task::spawn_blocking(move || extract_tgz(&archive, &target))
            .await
            .map_err(|e| anyhow!("extraction task failed: {}", e))
            .and_then(|result| result);

        match extracted {
            Ok(()) => Ok(destination),
            Err(e) => Err(DependencyError::Extraction {
                archive: artifact.to_path_buf(),
                destination,
                reason: format!("{:#}", e),
            }),
        }
    }

    async fn copy_package(&self, coordinate: &Coordinate, artifact: &Path) -> DependencyResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dependencies_dir)
            .await
            .map_err(|e| DependencyError::io(&self.dependencies_dir, e))?;

        let target = self.dependencies_dir.join(maven_file_name(coordinate));
        tokio::fs::copy(artifact, &target)
            .await
            .map_err(|e| DependencyError::io(&target, e))?;

        debug!("copied {} to {}", coordinate, target.display());
        Ok(target)
    }
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let file_name = path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{}.{}.{}", file_name, Uuid::new_v4().as_hyphenated(), suffix))
}

/// Extracts into a staging directory next to `destination` and renames it into place once it is
///  complete. A failed extraction leaves nothing behind at `destination`.
fn extract_tgz(archive: &Path, destination: &Path) -> anyhow::Result<()> {
    let parent = destination.parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", destination.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("creating {}", parent.display()))?;

    let staging = sibling_path(destination, "extracting");
    trace!("extracting {} via {}", archive.display(), staging.display());

    let result = unpack(archive, &staging)
        .and_then(|_| hoist_wrapper(&staging))
        .and_then(|_| fs::rename(&staging, destination)
            .with_context(|| format!("renaming {} to {}", staging.display(), destination.display())));

    if result.is_err() && staging.exists() {
        if let Err(cleanup_err) = fs::remove_dir_all(&staging) {
            error!("error cleaning up {} after failed extraction: {}", staging.display(), cleanup_err);
        }
    }
    result
}

fn unpack(archive: &Path, target: &Path) -> anyhow::Result<()> {
    let file = File::open(archive)
        .with_context(|| format!("opening {}", archive.display()))?;
    Archive::new(GzDecoder::new(file))
        .unpack(target)
        .with_context(|| format!("unpacking {}", archive.display()))
}

/// Moves the content of a top-level wrapper directory up one level and removes the wrapper.
fn hoist_wrapper(dir: &Path) -> anyhow::Result<()> {
    let wrapper = dir.join(WRAPPER_DIR);
    if !wrapper.is_dir() {
        return Ok(());
    }

    // the wrapper may itself contain an entry called "package"
    let moved = sibling_path(&wrapper, "hoisting");
    fs::rename(&wrapper, &moved)
        .with_context(|| format!("renaming {}", wrapper.display()))?;

    for entry in fs::read_dir(&moved)? {
        let entry = entry?;
        let target = dir.join(entry.file_name());
        fs::rename(entry.path(), &target)
            .with_context(|| format!("moving {} to {}", entry.path().display(), target.display()))?;
    }
    fs::remove_dir(&moved)
        .with_context(|| format!("removing {}", moved.display()))?;

    trace!("hoisted content of {}/ in {}", WRAPPER_DIR, dir.display());
    Ok(())
}
