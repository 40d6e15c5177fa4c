use std::path::Path;

use async_trait::async_trait;

use crate::error::FetchError;

mod curl;
mod http;

pub use curl::CurlFetcher;
pub use http::{HttpFetcher, HttpFetcherConfig};

/// Fetches one resource to a local file.
///
/// Implementations own their retry and redirect policy and only fail once
/// that policy gives up.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError>;
}
