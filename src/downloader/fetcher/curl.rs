use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

use super::Fetcher;
use crate::error::FetchError;

/// Fetches by running `curl`, which handles retries and redirects itself.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    program: OsString,
    attempts: u32,
}

impl CurlFetcher {
    pub fn new(attempts: u32) -> Self {
        CurlFetcher {
            program: OsString::from("curl"),
            attempts,
        }
    }

    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self, url: &str, destination: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["--fail", "--location", "--silent", "--show-error"]
            .into_iter()
            .map(OsString::from)
            .collect();
        // curl counts retries after the first try
        args.push("--retry".into());
        args.push(self.attempts.saturating_sub(1).to_string().into());
        args.push("--output".into());
        args.push(destination.as_os_str().to_owned());
        args.push(url.into());
        args
    }
}

#[async_trait]
impl Fetcher for CurlFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        debug!(url, program = ?self.program, "running transfer command");
        let output = Command::new(&self.program)
            .args(self.args(url, destination))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(FetchError::Spawn)?;

        if output.status.success() {
            return Ok(());
        }
        // curl may leave a truncated file behind
        if let Err(err) = fs::remove_file(destination).await {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(path = %destination.display(), error = %err, "cannot remove partial download");
            }
        }
        Err(FetchError::Command {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
