use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;

/// A body fetched from a repository, not yet materialized.
pub struct Blob {
    pub data: Pin<Box<dyn Stream<Item = anyhow::Result<Bytes>> + Send + 'static>>,
    pub content_length: Option<u64>,
}
