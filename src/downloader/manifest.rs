use std::fs;
use std::path::Path;

use crate::error::DownloadError;

/// Reads the manifest at `path` and returns its entries in file order.
pub fn read_manifest(path: &Path) -> Result<Vec<String>, DownloadError> {
    let contents = fs::read_to_string(path).map_err(|source| DownloadError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_manifest(&contents))
}

/// One entry per line. Blank lines and `#` comments are skipped; entries are
/// not validated, a bad URL only shows up when it is fetched.
pub fn parse_manifest(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
