use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use super::inventory::package_prefix;

/// One planned download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    pub url: String,
    pub destination: PathBuf,
}

pub struct Planer {
    destination_dir: PathBuf,
}

impl Planer {
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Planer {
            destination_dir: destination_dir.into(),
        }
    }

    /// Turns manifest entries into work items, in manifest order.
    ///
    /// An entry is dropped when a package with the same name prefix is
    /// already available locally (any version will do), or when an earlier
    /// entry already targets the same destination file.
    pub fn plan(&self, entries: &[String], local_prefixes: &HashSet<String>) -> Vec<WorkItem> {
        let mut destinations = HashSet::new();
        let mut items = Vec::new();

        for url in entries {
            let name = file_name(url);
            let prefix = package_prefix(name);
            if local_prefixes.contains(prefix) {
                debug!(url = %url, prefix, "already available locally, skipping");
                continue;
            }

            let destination = self.destination_dir.join(name);
            if !destinations.insert(destination.clone()) {
                debug!(url = %url, "duplicate manifest entry, skipping");
                continue;
            }

            items.push(WorkItem {
                url: url.clone(),
                destination,
            });
        }

        items
    }
}

/// Last path segment of `url`, ignoring any query string or fragment.
pub fn file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}
