use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use tracing::warn;

use super::request::DownloadRequest;
use crate::core::error::LauncherError;

/// Terminal state of one request in a batch.
#[derive(Debug)]
pub enum DownloadOutcome {
    Succeeded { elapsed: Duration, bytes: u64 },
    Failed(LauncherError),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Succeeded { .. })
    }
}

/// Receives byte counts as a transfer advances.
///
/// `total_bytes` is `None` when the server did not announce a length.
pub trait DownloadProgressListener: Send + Sync {
    fn on_progress(&self, request: &DownloadRequest, bytes_read: u64, total_bytes: Option<u64>);
}

/// Receives exactly one terminal outcome per request.
pub trait DownloadCompletionListener: Send + Sync {
    fn on_complete(&self, request: &DownloadRequest, outcome: &DownloadOutcome);
}

impl<F> DownloadProgressListener for F
where
    F: Fn(&DownloadRequest, u64, Option<u64>) + Send + Sync,
{
    fn on_progress(&self, request: &DownloadRequest, bytes_read: u64, total_bytes: Option<u64>) {
        self(request, bytes_read, total_bytes)
    }
}

impl<F> DownloadCompletionListener for F
where
    F: Fn(&DownloadRequest, &DownloadOutcome) + Send + Sync,
{
    fn on_complete(&self, request: &DownloadRequest, outcome: &DownloadOutcome) {
        self(request, outcome)
    }
}

// Listener panics are logged and swallowed so a faulty observer cannot
// abort a transfer or lose the outcome of another request.

pub(crate) fn notify_progress(
    listener: &dyn DownloadProgressListener,
    request: &DownloadRequest,
    bytes_read: u64,
    total_bytes: Option<u64>,
) {
    let result = catch_unwind(AssertUnwindSafe(|| {
        listener.on_progress(request, bytes_read, total_bytes)
    }));
    if result.is_err() {
        warn!(url = %request.source(), "Progress listener panicked");
    }
}

pub(crate) fn notify_completion(
    listener: &dyn DownloadCompletionListener,
    request: &DownloadRequest,
    outcome: &DownloadOutcome,
) {
    let result = catch_unwind(AssertUnwindSafe(|| listener.on_complete(request, outcome)));
    if result.is_err() {
        warn!(url = %request.source(), "Completion listener panicked");
    }
}
