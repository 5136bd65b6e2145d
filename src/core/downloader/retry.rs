use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{BatchReport, DownloadRequest, FileDownloader};
use crate::core::error::LauncherResult;

/// Runs batches until every queued request succeeded or used up its
/// attempt budget (`DownloadRequest::retries`).
///
/// The returned report lists each request once: its success, or its last
/// failure.
pub async fn download_with_retries(
    downloader: &dyn FileDownloader,
    cancel: &CancellationToken,
) -> LauncherResult<BatchReport> {
    let mut attempts: HashMap<DownloadRequest, u32> = HashMap::new();
    let mut report = BatchReport::default();

    loop {
        let batch = downloader.download_until(cancel).await?;
        report.succeeded.extend(batch.succeeded);

        let mut again = Vec::new();
        for (request, error) in batch.failed {
            let used = attempts.entry(request.clone()).or_insert(0);
            *used += 1;
            if *used < request.retries() {
                debug!("Retrying {} (attempt {} of {})", request, *used + 1, request.retries());
                again.push(request);
            } else {
                warn!("Giving up on {} after {} attempt(s): {}", request, used, error);
                report.failed.push((request, error));
            }
        }

        if again.is_empty() {
            return Ok(report);
        }
        downloader.enqueue_all(again)?;
    }
}
