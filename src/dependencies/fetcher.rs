use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info, trace};

use crate::cache::fs_artifact_cache::FsArtifactCache;
use crate::dependencies::flatten::FlatDependencyMap;
use crate::error::{DependencyError, DependencyResult};
use crate::maven::coordinates::{ArtifactType, Coordinate};
use crate::maven::paths::{as_maven_path, maven_file_name};
use crate::maven::remote_repo::MavenRepository;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Downloads artifacts into the on-disk cache, at most once per destination path at a time.
pub struct ArtifactFetcher {
    repo: Arc<dyn MavenRepository>,
    cache: FsArtifactCache,
    use_cache: bool,
    timeout: Duration,
    in_flight: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}
impl ArtifactFetcher {
    pub fn new(repo: Arc<dyn MavenRepository>, cache: FsArtifactCache, use_cache: bool) -> ArtifactFetcher {
        ArtifactFetcher {
            repo,
            cache,
            use_cache,
            timeout: DEFAULT_TIMEOUT,
            in_flight: Default::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> ArtifactFetcher {
        self.timeout = timeout;
        self
    }

    /// Returns the local path of the artifact, downloading it unless caching is enabled and it is
    ///  already there. `destination` replaces the cache directory the file is placed in.
    ///
    /// Repository metadata is always downloaded since it changes with every snapshot build.
    pub async fn fetch_artifact(&self, coordinate: &Coordinate, destination: Option<&Path>) -> DependencyResult<PathBuf> {
        let maven_path = as_maven_path(coordinate);
        let url = self.repo.url_for(&maven_path);

        if coordinate.version.is_placeholder() {
            return Err(DependencyError::ArtifactDownload {
                coordinate: coordinate.to_string(),
                url,
                reason: "version contains an unresolved property".to_string(),
            });
        }

        let path = match destination {
            Some(dir) => dir.join(maven_file_name(coordinate)),
            None => self.cache.path_for(coordinate),
        };

        let lock = self.lock_for(&path);
        let result = {
            let _guard = lock.lock().await;
            self.fetch_locked(coordinate, &maven_path, &url, &path).await
        };
        self.release(&path, lock);
        result
    }

    async fn fetch_locked(&self, coordinate: &Coordinate, maven_path: &str, url: &str, path: &Path) -> DependencyResult<PathBuf> {
        let download_error = |reason: String| DependencyError::ArtifactDownload {
            coordinate: coordinate.to_string(),
            url: url.to_string(),
            reason,
        };

        if self.use_cache && coordinate.artifact_type != ArtifactType::Metadata {
            if FsArtifactCache::contains(path).await.map_err(|e| download_error(format!("{:#}", e)))? {
                debug!("{} found in cache at {}", coordinate, path.display());
                return Ok(path.to_path_buf());
            }
        }

        debug!("downloading {} from {}", coordinate, url);
        let download = async {
            let blob = self.repo.get(maven_path).await?;
            if let Some(content_length) = blob.content_length {
                trace!("{}: {} bytes", url, content_length);
            }
            FsArtifactCache::insert(path, blob.data).await
        };
        let num_bytes = match tokio::time::timeout(self.timeout, download).await {
            Ok(result) => result.map_err(|e| download_error(format!("{:#}", e)))?,
            Err(_) => return Err(download_error(format!("timed out after {}s", self.timeout.as_secs_f32()))),
        };

        debug!("downloaded {} ({} bytes) to {}", coordinate, num_bytes, path.display());
        Ok(path.to_path_buf())
    }

    /// Fetches every artifact of the map with at most `concurrency` downloads in flight. The
    ///  first failure aborts the whole batch.
    pub async fn fetch_all(&self, dependencies: &FlatDependencyMap, concurrency: usize) -> DependencyResult<Vec<(Coordinate, PathBuf)>> {
        info!("fetching {} artifacts, concurrency={}", dependencies.len(), concurrency);

        stream::iter(dependencies.values())
            .map(|coordinate| async move {
                let path = self.fetch_artifact(coordinate, None).await?;
                Ok::<_, DependencyError>((coordinate.clone(), path))
            })
            .buffer_unordered(concurrency.max(1))
            .try_collect()
            .await
    }

    fn lock_for(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.in_flight.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.entry(path.to_path_buf())
            .or_default()
            .clone()
    }

    /// drops the path's lock from the map unless another fetch is waiting for it
    fn release(&self, path: &Path, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        drop(lock);
        if in_flight.get(path).map(|l| Arc::strong_count(l) == 1).unwrap_or(false) {
            in_flight.remove(path);
        }
    }
}
