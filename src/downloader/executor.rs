use std::sync::Arc;

use tracing::{error, info};

use super::fetcher::Fetcher;
use super::planer::WorkItem;
use super::status::StatusLog;
use crate::error::{BatchFailure, DownloadError, FetchError, ItemFailure};
use crate::utils::limited_spawner::LimitedSpawner;

/// Outcome of a whole batch once every item has finished.
#[derive(Debug)]
pub struct BatchReport {
    total: usize,
    failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn succeeded(&self) -> usize {
        self.total - self.failures.len()
    }

    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> Result<(), DownloadError> {
        if self.failures.is_empty() {
            return Ok(());
        }
        Err(BatchFailure {
            total: self.total,
            failures: self.failures.into_iter().collect(),
        }
        .into())
    }
}

async fn execute_item(
    item: &WorkItem,
    fetcher: &dyn Fetcher,
    status: &StatusLog,
) -> Result<(), FetchError> {
    status.started(item);
    match fetcher.fetch(&item.url, &item.destination).await {
        Ok(()) => {
            status.finished(item);
            Ok(())
        }
        Err(err) => {
            status.failed(&item.url, &err);
            Err(err)
        }
    }
}

/// Runs every item with at most `concurrency` transfers in flight.
///
/// A failing item never stops the others: this only returns once every item
/// has succeeded or failed, and the report says which ones failed.
pub async fn execute_work_items(
    items: Vec<WorkItem>,
    concurrency: usize,
    fetcher: Arc<dyn Fetcher>,
    status: Arc<StatusLog>,
) -> BatchReport {
    let total = items.len();
    let mut spawner = LimitedSpawner::new(concurrency);
    let mut submitted = Vec::with_capacity(total);
    let mut failures = Vec::new();

    info!(total, concurrency = spawner.limit(), "starting downloads");

    for item in items {
        let url = item.url.clone();
        let fetcher = Arc::clone(&fetcher);
        let worker_status = Arc::clone(&status);
        let spawned = spawner
            .spawn(async move { execute_item(&item, fetcher.as_ref(), &worker_status).await })
            .await;
        match spawned {
            Ok(()) => submitted.push(url),
            Err(err) => {
                let err = FetchError::Worker(err.to_string());
                status.failed(&url, &err);
                failures.push(ItemFailure { url, error: err });
            }
        }
    }

    for (url, outcome) in submitted.into_iter().zip(spawner.join().await) {
        let err = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => err,
            Err(join_err) => {
                // the worker died before it could report
                let err = FetchError::Worker(join_err.to_string());
                status.failed(&url, &err);
                err
            }
        };
        failures.push(ItemFailure { url, error: err });
    }

    let report = BatchReport { total, failures };
    if report.is_success() {
        info!(total = report.total(), "all downloads finished");
    } else {
        error!(
            total = report.total(),
            succeeded = report.succeeded(),
            failed = report.failures().len(),
            "some downloads failed"
        );
    }
    report
}
