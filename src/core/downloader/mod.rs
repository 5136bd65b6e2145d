// ─── Download Orchestrator ───
// Queues file requests and fetches them in batches over a bounded pool.

mod client;
mod listener;
mod request;
mod retry;

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use client::{HttpDownloader, DEFAULT_CONCURRENCY, DEFAULT_SHUTDOWN_GRACE};
pub use listener::{DownloadCompletionListener, DownloadOutcome, DownloadProgressListener};
pub use request::{DownloadRequest, DEFAULT_RETRIES, DEFAULT_TIMEOUT};
pub use retry::download_with_retries;

use crate::core::error::{LauncherError, LauncherResult};

/// A transport able to fetch some family of request schemes.
///
/// Several implementations may coexist; callers route each request to the
/// first one whose [`can_handle`](FileDownloader::can_handle) accepts it.
#[async_trait]
pub trait FileDownloader: Send + Sync {
    fn can_handle(&self, request: &DownloadRequest) -> bool;

    /// True from the start of a batch until every request in it settled.
    fn is_busy(&self) -> bool;

    /// Fails with `UnsupportedDownloadRequest` when `can_handle` refuses.
    fn enqueue(&self, request: DownloadRequest) -> LauncherResult<()>;

    /// Queues every request or none of them.
    fn enqueue_all(&self, requests: Vec<DownloadRequest>) -> LauncherResult<()>;

    /// Fetches everything queued so far and waits for every outcome.
    async fn download(&self) -> LauncherResult<BatchReport> {
        self.download_until(&CancellationToken::new()).await
    }

    /// Like [`download`](FileDownloader::download), aborting in-flight
    /// transfers once `cancel` fires.
    async fn download_until(&self, cancel: &CancellationToken) -> LauncherResult<BatchReport>;

    async fn close(&self) -> LauncherResult<()>;
}

/// Per-request results of one batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Request, wall time, bytes written.
    pub succeeded: Vec<(DownloadRequest, Duration, u64)>,
    pub failed: Vec<(DownloadRequest, LauncherError)>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.succeeded.iter().map(|(_, _, bytes)| bytes).sum()
    }

    /// Folds another batch into this one.
    pub fn merge(&mut self, other: BatchReport) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }

    /// Turns the first failure into an error.
    pub fn into_result(mut self) -> LauncherResult<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            let (_, e) = self.failed.remove(0);
            Err(e)
        }
    }
}
