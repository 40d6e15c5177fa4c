use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, redirect};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::Fetcher;
use crate::downloader::inventory::PARTIAL_SUFFIX;
use crate::error::FetchError;

const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Total tries per resource, including the first one.
    pub attempts: u32,
    pub retry_delay: Duration,
    /// Longest wait for a connection or for the next chunk of data. The
    /// transfer as a whole is not time-limited.
    pub timeout: Duration,
}

/// Native HTTP(S) transfer.
///
/// The body is streamed into `<destination>.part` and moved into place only
/// once it is complete, so a failed transfer never leaves a file that looks
/// like an available package.
pub struct HttpFetcher {
    client: Client,
    config: HttpFetcherConfig,
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .build()?;
        Ok(HttpFetcher { client, config })
    }

    async fn attempt(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let partial = partial_path(destination);
        let written = match write_body(response, &partial).await {
            Ok(()) => fs::rename(&partial, destination)
                .await
                .map_err(|source| FetchError::Io {
                    path: destination.to_path_buf(),
                    source,
                }),
            Err(err) => Err(err),
        };
        if written.is_err() {
            if let Err(err) = fs::remove_file(&partial).await {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(path = %partial.display(), error = %err, "cannot remove partial download");
                }
            }
        }
        written
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        let attempts = self.config.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.attempt(url, destination).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < attempts && err.is_retryable() => {
                    debug!(url, attempt, attempts, error = %err, "transfer failed, retrying");
                    tokio::time::sleep(self.config.retry_delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

async fn write_body(response: Response, path: &Path) -> Result<(), FetchError> {
    let io_err = |source: io::Error| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).await.map_err(io_err)?;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        file.write_all(&chunk?).await.map_err(io_err)?;
    }
    file.flush().await.map_err(io_err)
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
