use std::collections::HashSet;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::DownloadError;

/// Suffix of a transfer that is still being written.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Package identity of a file name: everything before the first digit, so
/// `nginx-1.20.1.rpm` and `nginx-1.22.0.rpm` are the same package. A name
/// without digits is its own prefix.
pub fn package_prefix(name: &str) -> &str {
    match name.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// Prefixes of the files directly inside `dir`. A missing directory is an
/// empty inventory.
pub fn local_prefixes(dir: &Path) -> Result<HashSet<String>, DownloadError> {
    let mut prefixes = HashSet::new();
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "no local inventory");
        return Ok(prefixes);
    }

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if is_dangling_entry(&err) => {
                debug!(path = ?err.path(), error = %err, "skipping unreadable inventory entry");
                continue;
            }
            Err(source) => {
                return Err(DownloadError::Inventory {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        // leftovers of an interrupted transfer do not count as available
        if name.ends_with(PARTIAL_SUFFIX) {
            continue;
        }
        prefixes.insert(package_prefix(&name).to_string());
    }

    debug!(dir = %dir.display(), count = prefixes.len(), "scanned local inventory");
    Ok(prefixes)
}

/// A broken symlink or a link loop below the inventory root is not a file
/// and does not make the directory unreadable.
fn is_dangling_entry(err: &walkdir::Error) -> bool {
    if err.depth() == 0 {
        return false;
    }
    err.loop_ancestor().is_some()
        || err
            .io_error()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}
