use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::StreamExt;
use futures_core::Stream;
use tokio::fs::{create_dir_all, rename, try_exists, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{error, trace};
use uuid::Uuid;

use crate::maven::coordinates::Coordinate;
use crate::maven::paths::as_maven_path;

/// Artifacts on disk in Maven repository layout below a root directory. The existence of a file
///  is the entire cache index.
pub struct FsArtifactCache {
    root: PathBuf,
}
impl FsArtifactCache {
    pub fn new(root: impl Into<PathBuf>) -> FsArtifactCache {
        FsArtifactCache {
            root: root.into(),
        }
    }

    pub fn path_for(&self, coordinate: &Coordinate) -> PathBuf {
        let mut result = self.root.clone();
        for segment in as_maven_path(coordinate).split('/') {
            result.push(segment);
        }
        result
    }

    pub async fn contains(path: &Path) -> anyhow::Result<bool> {
        Ok(try_exists(path).await?)
    }

    /// Streams data into `path`, replacing whatever is there. The data goes to a temporary file
    ///  next to the target first and is renamed into place once complete, so a partially written
    ///  file is never visible under `path`.
    pub async fn insert(
        path: &Path,
        data: impl Stream<Item = anyhow::Result<Bytes>> + Send,
    ) -> anyhow::Result<u64> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent).await?;
        }

        let file_name = path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let temp_path = path.with_file_name(format!("{}.{}.inserting", file_name, Uuid::new_v4().as_hyphenated()));

        trace!("inserting {} via {}", path.display(), temp_path.display());

        // removes the temporary file on every exit but a successful rename, including the
        //  future being dropped mid-stream
        let mut temp_file = TempFile::new(temp_path);
        let num_bytes = Self::do_insert(&temp_file.path, data).await?;
        rename(&temp_file.path, path).await?;
        temp_file.persisted = true;
        Ok(num_bytes)
    }

    async fn do_insert(
        temp_path: &Path,
        data: impl Stream<Item = anyhow::Result<Bytes>> + Send,
    ) -> anyhow::Result<u64> {
        let mut data = Box::pin(data);

        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(temp_path)
            .await?;

        let mut num_bytes = 0u64;
        while let Some(bytes) = data.next().await {
            let bytes = bytes?;
            num_bytes += bytes.len() as u64;
            file.write_all(&bytes).await?;
        }
        file.flush().await?;

        Ok(num_bytes)
    }
}

struct TempFile {
    path: PathBuf,
    persisted: bool,
}
impl TempFile {
    fn new(path: PathBuf) -> TempFile {
        TempFile {
            path,
            persisted: false,
        }
    }
}
impl Drop for TempFile {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => trace!("removed {} after failed attempt to insert", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => error!("error cleaning up {} after failed attempt to insert: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod test {
    use anyhow::anyhow;

    use super::*;
    use crate::maven::coordinates::ArtifactType;

    fn chunks(chunks: Vec<anyhow::Result<&'static [u8]>>) -> impl Stream<Item = anyhow::Result<Bytes>> + Send {
        futures::stream::iter(chunks.into_iter().map(|c| c.map(Bytes::from_static)))
    }

    #[test]
    fn test_path_for() {
        let cache = FsArtifactCache::new("/var/cache/nat");
        let mut coordinate = Coordinate::new("com.acme", "types", "1.0.0");
        coordinate.artifact_type = ArtifactType::Tgz;

        assert_eq!(cache.path_for(&coordinate), PathBuf::from("/var/cache/nat/com/acme/types/1.0.0/types-1.0.0.tgz"));
    }

    #[tokio::test]
    async fn test_insert_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("file.package");

        let num_bytes = FsArtifactCache::insert(&path, chunks(vec![Ok(b"abc"), Ok(b"def")])).await.unwrap();

        assert_eq!(num_bytes, 6);
        assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");
        assert!(FsArtifactCache::contains(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.pom");
        std::fs::write(&path, b"old").unwrap();

        FsArtifactCache::insert(&path, chunks(vec![Ok(b"new")])).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.tgz");

        let result = FsArtifactCache::insert(&path, chunks(vec![Ok(b"abc"), Err(anyhow!("connection reset"))])).await;

        assert!(result.is_err());
        assert!(!FsArtifactCache::contains(&path).await.unwrap());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_insert_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.tgz");
        let stalled = futures::stream::once(async { Ok::<_, anyhow::Error>(Bytes::from_static(b"abc")) })
            .chain(futures::stream::pending());

        let result = tokio::time::timeout(std::time::Duration::from_millis(100), FsArtifactCache::insert(&path, stalled)).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
