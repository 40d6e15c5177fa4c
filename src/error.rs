//! Error types for manifest planning and batch downloads.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::utils::multierr::MultiError;

/// Failure of a single transfer.
///
/// Raised by a [`Fetcher`](crate::downloader::Fetcher) once its own retry
/// budget is spent. The executor records it; it never escapes a worker.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot launch transfer command: {0}")]
    Spawn(#[source] io::Error),

    #[error("transfer command exited with {status}: {stderr}")]
    Command { status: ExitStatus, stderr: String },

    /// The worker running the transfer stopped without producing a result.
    #[error("download worker stopped: {0}")]
    Worker(String),
}

impl FetchError {
    /// Whether another attempt could succeed. Connection trouble, timeouts,
    /// throttling and server-side errors are transient; everything else is
    /// definitive.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Request(err) => {
                err.is_connect() || err.is_timeout() || err.is_body() || err.is_request()
            }
            FetchError::Status { status, .. } => {
                status.is_server_error()
                    || *status == reqwest::StatusCode::REQUEST_TIMEOUT
                    || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

/// A work item that ended in failure.
#[derive(Debug, Error)]
#[error("{url}: {error}")]
pub struct ItemFailure {
    pub url: String,
    pub error: FetchError,
}

/// At least one item of a batch failed. Only raised after every item of the
/// batch reached a terminal state.
#[derive(Debug, Error)]
#[error("{} of {total} downloads failed", .failures.len())]
pub struct BatchFailure {
    pub total: usize,
    pub failures: MultiError<ItemFailure>,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("cannot read manifest {}", .path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot scan local inventory {}", .path.display())]
    Inventory {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("cannot create destination directory {}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Batch(#[from] BatchFailure),
}
