use anyhow::anyhow;
use futures::TryStreamExt;
use hyper::{Body, Client, Request, Uri};
use hyper::client::HttpConnector;
use hyper::header::{AUTHORIZATION, CONTENT_LENGTH, USER_AGENT};
use hyper_tls::HttpsConnector;
use tracing::trace;

use crate::util::blob::Blob;

/// some repositories (e.g. Maven Central) return a 403 without a user agent
const USER_AGENT_VALUE: &str = concat!("nat-deps/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}
impl Credentials {
    pub fn basic_auth_header(&self) -> String {
        format!("Basic {}", base64::encode(format!("{}:{}", self.username, self.password)))
    }
}

/// Downloads files relative to a fixed base URI, optionally with basic authentication.
///
/// Instances do HTTP connection caching internally, so keeping them alive has performance benefits.
pub struct HttpDownloader {
    client: Client<HttpsConnector<HttpConnector>>,
    base_uri: String, // with trailing '/'
    credentials: Option<Credentials>,
}
impl HttpDownloader {
    pub fn new(base_uri: String, credentials: Option<Credentials>) -> anyhow::Result<HttpDownloader> {
        let mut base_uri = base_uri;
        if !base_uri.ends_with('/') {
            base_uri.push('/');
        }

        // check that the base URI is valid
        Uri::try_from(base_uri.clone())?;

        Ok(HttpDownloader {
            client: Client::builder()
                .build::<_, Body>(HttpsConnector::new()),
            base_uri,
            credentials,
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_uri, path.trim_start_matches('/'))
    }

    /// Issues the GET and hands out the response body as a stream. Non-success responses are
    ///  errors, the body is not read in that case.
    pub async fn get(&self, path: &str) -> anyhow::Result<Blob> {
        let url = self.url_for(path);
        let mut request = Request::builder()
            .method("GET")
            .uri(Uri::try_from(url.clone())?)
            .header(USER_AGENT, USER_AGENT_VALUE);
        if let Some(credentials) = &self.credentials {
            request = request.header(AUTHORIZATION, credentials.basic_auth_header());
        }
        let request = request.body(Body::empty())?;

        trace!("getting {}", url);

        let response = self.client.request(request)
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("GET {} failed: {}", url, response.status()));
        }

        let content_length = response.headers().get(CONTENT_LENGTH)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        Ok(Blob {
            data: Box::pin(response.into_body().map_err(anyhow::Error::from)),
            content_length,
        })
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use futures::StreamExt;

    use super::*;

    struct MockRepo {
        files: HashMap<String, Vec<u8>>,
        expected_auth: Option<String>,
    }

    async fn serve(State(repo): State<Arc<MockRepo>>, Path(path): Path<String>, headers: HeaderMap) -> (StatusCode, Vec<u8>) {
        if let Some(expected) = &repo.expected_auth {
            let actual = headers.get("authorization").and_then(|h| h.to_str().ok());
            if actual != Some(expected.as_str()) {
                return (StatusCode::UNAUTHORIZED, vec![]);
            }
        }
        match repo.files.get(path.trim_start_matches('/')) {
            Some(data) => (StatusCode::OK, data.clone()),
            None => (StatusCode::NOT_FOUND, vec![]),
        }
    }

    /// starts a repository server on an ephemeral port and returns its base URL
    fn start_mock_repo(repo: MockRepo) -> String {
        let app = Router::new()
            .route("/repo/*path", get(serve))
            .with_state(Arc::new(repo));

        let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
            .serve(app.into_make_service());
        let addr = server.local_addr();
        tokio::spawn(server);
        format!("http://{}/repo", addr)
    }

    async fn collect(blob: Blob) -> Vec<u8> {
        let mut data = blob.data;
        let mut result = Vec::new();
        while let Some(chunk) = data.next().await {
            result.extend_from_slice(&chunk.unwrap());
        }
        result
    }

    fn credentials() -> Credentials {
        Credentials { username: "deployer".to_string(), password: "s3cret".to_string() }
    }

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(credentials().basic_auth_header(), "Basic ZGVwbG95ZXI6czNjcmV0");
    }

    #[test]
    fn test_url_for() {
        let downloader = HttpDownloader::new("https://repo.example.com/maven2".to_string(), None).unwrap();
        assert_eq!(downloader.url_for("com/acme/lib/1.0/lib-1.0.pom"), "https://repo.example.com/maven2/com/acme/lib/1.0/lib-1.0.pom");
        assert_eq!(downloader.url_for("/com/acme"), "https://repo.example.com/maven2/com/acme");
    }

    #[test]
    fn test_invalid_base_uri() {
        assert!(HttpDownloader::new("not a uri".to_string(), None).is_err());
    }

    #[tokio::test]
    async fn test_get_with_basic_auth() {
        let base = start_mock_repo(MockRepo {
            files: HashMap::from([("com/acme/lib/1.0/lib-1.0.pom".to_string(), b"<project/>".to_vec())]),
            expected_auth: Some(credentials().basic_auth_header()),
        });

        let downloader = HttpDownloader::new(base.clone(), Some(credentials())).unwrap();
        let blob = downloader.get("com/acme/lib/1.0/lib-1.0.pom").await.unwrap();
        assert_eq!(blob.content_length, Some(10));
        assert_eq!(collect(blob).await, b"<project/>".to_vec());

        let anonymous = HttpDownloader::new(base, None).unwrap();
        let err = anonymous.get("com/acme/lib/1.0/lib-1.0.pom").await.err().unwrap();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_get_missing_file() {
        let base = start_mock_repo(MockRepo { files: HashMap::new(), expected_auth: None });

        let downloader = HttpDownloader::new(base, None).unwrap();
        let err = downloader.get("com/acme/missing/1.0/missing-1.0.pom").await.err().unwrap();
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("com/acme/missing/1.0/missing-1.0.pom"));
    }
}
