use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use tracing::{debug, warn};

use super::planer::WorkItem;

/// Progress lines shared by all download workers.
///
/// Every message is written and flushed while holding the lock, so lines
/// from concurrent workers interleave but never tear. The lock is never held
/// across an await point.
pub struct StatusLog {
    out: Mutex<Box<dyn Write + Send>>,
}

impl StatusLog {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        StatusLog {
            out: Mutex::new(Box::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn started(&self, item: &WorkItem) {
        debug!(url = %item.url, destination = %item.destination.display(), "download started");
        self.write_line(format_args!(
            "Downloading {} to {}...",
            item.url,
            item.destination.display()
        ));
    }

    pub fn finished(&self, item: &WorkItem) {
        debug!(url = %item.url, "download finished");
        self.write_line(format_args!("Finished downloading {}", item.url));
    }

    pub fn failed(&self, url: &str, error: &dyn fmt::Display) {
        debug!(url, %error, "download failed");
        self.write_line(format_args!("Error downloading {url}: {error}"));
    }

    fn write_line(&self, line: fmt::Arguments<'_>) {
        // a poisoned lock only means another writer panicked mid-line
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!(error = %err, "cannot write status line");
        }
    }
}
