//! Command-line and environment settings for a fetch run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::downloader::{CurlFetcher, DEFAULT_CONCURRENCY, Fetcher, HttpFetcher, HttpFetcherConfig};
use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransferKind {
    /// Built-in HTTP client
    Http,
    /// Shell out to `curl`
    Curl,
}

#[derive(Debug, Clone, Args)]
pub struct FetchOptions {
    #[arg(short, long, env = "OFFLINE_FETCH_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY, help = "Downloads running at once")]
    pub concurrency: usize,
    #[arg(long, env = "OFFLINE_FETCH_ATTEMPTS", default_value_t = 10, help = "Tries per resource")]
    pub attempts: u32,
    #[arg(long, env = "OFFLINE_FETCH_RETRY_DELAY_MS", default_value_t = 1000)]
    pub retry_delay_ms: u64,
    #[arg(
        long,
        env = "OFFLINE_FETCH_TIMEOUT_SECS",
        default_value_t = 300,
        help = "Seconds to wait for a connection or for more data (a transfer that keeps progressing is not cut off)"
    )]
    pub timeout_secs: u64,
    #[arg(long, env = "OFFLINE_FETCH_TRANSFER", value_enum, default_value_t = TransferKind::Http)]
    pub transfer: TransferKind,
    #[arg(long, env = "OFFLINE_FETCH_CURL", default_value = "curl", help = "curl binary for --transfer curl")]
    pub curl: PathBuf,
}

impl FetchOptions {
    pub fn http_config(&self) -> HttpFetcherConfig {
        HttpFetcherConfig {
            attempts: self.attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn build_fetcher(&self) -> Result<Arc<dyn Fetcher>, FetchError> {
        let fetcher: Arc<dyn Fetcher> = match self.transfer {
            TransferKind::Http => Arc::new(HttpFetcher::new(self.http_config())?),
            TransferKind::Curl => {
                Arc::new(CurlFetcher::new(self.attempts).with_program(&self.curl))
            }
        };
        Ok(fetcher)
    }
}
