use async_trait::async_trait;

use crate::util::blob::Blob;
use crate::util::http_downloader::{Credentials, HttpDownloader};

/// Read access to a Maven repository by repository-relative path (e.g. "com/acme/lib/1.0/lib-1.0.pom")
#[async_trait]
pub trait MavenRepository: Send + Sync {
    /// the absolute URL for a path, for error messages and logging
    fn url_for(&self, path: &str) -> String;

    async fn get(&self, path: &str) -> anyhow::Result<Blob>;
}

pub struct RemoteMavenRepo {
    downloader: HttpDownloader,
}
impl RemoteMavenRepo {
    pub fn new(base_uri: String, credentials: Option<Credentials>) -> anyhow::Result<RemoteMavenRepo> {
        Ok(RemoteMavenRepo {
            downloader: HttpDownloader::new(base_uri, credentials)?,
        })
    }
}

#[async_trait]
impl MavenRepository for RemoteMavenRepo {
    fn url_for(&self, path: &str) -> String {
        self.downloader.url_for(path)
    }

    async fn get(&self, path: &str) -> anyhow::Result<Blob> {
        self.downloader.get(path).await
    }
}
