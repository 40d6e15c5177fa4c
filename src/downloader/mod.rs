mod executor;
mod fetcher;
mod inventory;
mod manifest;
mod planer;
mod status;

use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::info;

use crate::error::DownloadError;

pub use executor::execute_work_items;
pub use fetcher::{CurlFetcher, Fetcher, HttpFetcher, HttpFetcherConfig};
pub use planer::{Planer, WorkItem};
pub use status::StatusLog;

pub const DEFAULT_CONCURRENCY: usize = 5;

/// Work items needed to bring `destination_dir` up to date with the manifest,
/// given what `local_dir` already holds. Touches no network.
pub fn plan(
    manifest_path: &Path,
    destination_dir: &Path,
    local_dir: &Path,
) -> Result<Vec<WorkItem>, DownloadError> {
    let entries = manifest::read_manifest(manifest_path)?;
    let local = inventory::local_prefixes(local_dir)?;
    let items = Planer::new(destination_dir).plan(&entries, &local);
    info!(
        entries = entries.len(),
        skipped = entries.len() - items.len(),
        planned = items.len(),
        "download plan ready"
    );
    Ok(items)
}

/// Downloads every manifest entry that is not already available locally.
///
/// Returns only after every planned download has finished; any failure
/// among them turns into a single [`DownloadError::Batch`].
pub async fn fetch_all(
    manifest_path: &Path,
    destination_dir: &Path,
    local_dir: &Path,
    concurrency: usize,
    fetcher: Arc<dyn Fetcher>,
    status: Arc<StatusLog>,
) -> Result<(), DownloadError> {
    let items = plan(manifest_path, destination_dir, local_dir)?;
    if items.is_empty() {
        info!("nothing to download");
        return Ok(());
    }

    fs::create_dir_all(destination_dir)
        .await
        .map_err(|source| DownloadError::CreateDir {
            path: destination_dir.to_path_buf(),
            source,
        })?;

    execute_work_items(items, concurrency, fetcher, status)
        .await
        .into_result()
}


#[cfg(test)]
mod tests {
    use super::testing::{MockFetcher, SharedBuffer};
    use super::*;
    use std::fs;

    const MANIFEST: &str = "\
# offline bundle resources
http://repo/el8/nginx-1.20.1.rpm
http://repo/el8/erlang-23.3.4.rpm

http://repo/el8/rabbitmq-server-3.8.16.rpm
# http://repo/el8/skipped-1.0.rpm
http://repo/el8/postgresql14-server-14.2.rpm
http://repo/el8/nodejs-16.14.rpm
";

    fn write_manifest(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("packages.txt");
        fs::write(&path, MANIFEST).unwrap();
        path
    }

    #[test]
    fn test_plan_against_local_inventory() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = write_manifest(tmp.path());
        let local = tmp.path().join("local");
        fs::create_dir(&local).unwrap();
        // older versions of two packages
        fs::write(local.join("nginx-1.18.0.rpm"), b"").unwrap();
        fs::write(local.join("nodejs-14.1.rpm"), b"").unwrap();

        let dest = tmp.path().join("dest");
        let items = plan(&manifest, &dest, &local).unwrap();

        let urls: Vec<_> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://repo/el8/erlang-23.3.4.rpm",
                "http://repo/el8/rabbitmq-server-3.8.16.rpm",
                "http://repo/el8/postgresql14-server-14.2.rpm",
            ]
        );
        assert_eq!(items[0].destination, dest.join("erlang-23.3.4.rpm"));
    }

    #[tokio::test]
    async fn test_fetch_all_then_rerun_plans_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = write_manifest(tmp.path());
        let dest = tmp.path().join("resources");

        let fetcher = Arc::new(MockFetcher::default().writing_files());
        let buffer = SharedBuffer::default();
        fetch_all(
            &manifest,
            &dest,
            &dest,
            DEFAULT_CONCURRENCY,
            fetcher.clone(),
            Arc::new(StatusLog::new(buffer.clone())),
        )
        .await
        .unwrap();

        assert_eq!(fetcher.calls().len(), 5);
        assert!(dest.join("nginx-1.20.1.rpm").is_file());
        assert_eq!(
            buffer
                .lines()
                .iter()
                .filter(|l| l.starts_with("Finished downloading"))
                .count(),
            5
        );

        assert!(plan(&manifest, &dest, &dest).unwrap().is_empty());

        let again = Arc::new(MockFetcher::default());
        fetch_all(
            &manifest,
            &dest,
            &dest,
            DEFAULT_CONCURRENCY,
            again.clone(),
            Arc::new(StatusLog::new(SharedBuffer::default())),
        )
        .await
        .unwrap();
        assert!(again.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_reports_batch_failure_after_all_attempts() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = write_manifest(tmp.path());
        let dest = tmp.path().join("resources");

        let fetcher = Arc::new(
            MockFetcher::default()
                .writing_files()
                .failing("http://repo/el8/erlang-23.3.4.rpm"),
        );
        let buffer = SharedBuffer::default();
        let err = fetch_all(
            &manifest,
            &dest,
            &dest,
            2,
            fetcher.clone(),
            Arc::new(StatusLog::new(buffer.clone())),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DownloadError::Batch(_)));
        assert_eq!(err.to_string(), "1 of 5 downloads failed");
        assert_eq!(fetcher.calls().len(), 5);
        assert_eq!(
            buffer
                .lines()
                .iter()
                .filter(|l| l.starts_with("Downloading "))
                .count(),
            5
        );

        // only the failed package is planned again
        let remaining = plan(&manifest, &dest, &dest).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].url, "http://repo/el8/erlang-23.3.4.rpm");
    }

    #[tokio::test]
    async fn test_fetch_all_missing_manifest_fails_before_fetching() {
        let tmp = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::default());

        let err = fetch_all(
            &tmp.path().join("missing.txt"),
            &tmp.path().join("dest"),
            &tmp.path().join("dest"),
            DEFAULT_CONCURRENCY,
            fetcher.clone(),
            Arc::new(StatusLog::new(SharedBuffer::default())),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DownloadError::ManifestRead { .. }));
        assert!(fetcher.calls().is_empty());
        assert!(!tmp.path().join("dest").exists());
    }

    #[tokio::test]
    async fn test_fetch_all_separate_inventory_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = write_manifest(tmp.path());
        let local = tmp.path().join("cache");
        fs::create_dir(&local).unwrap();
        for name in [
            "nginx-1.20.1.rpm",
            "erlang-22.0.rpm",
            "rabbitmq-server-3.7.rpm",
            "postgresql14-server-14.1.rpm",
        ] {
            fs::write(local.join(name), b"").unwrap();
        }
        let dest = tmp.path().join("resources");

        let fetcher = Arc::new(MockFetcher::default().writing_files());
        fetch_all(
            &manifest,
            &dest,
            &local,
            DEFAULT_CONCURRENCY,
            fetcher.clone(),
            Arc::new(StatusLog::new(SharedBuffer::default())),
        )
        .await
        .unwrap();

        assert_eq!(fetcher.calls(), vec!["http://repo/el8/nodejs-16.14.rpm"]);
        assert!(dest.join("nodejs-16.14.rpm").is_file());
    }
}
