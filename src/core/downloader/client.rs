use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::listener::{
    notify_completion, notify_progress, DownloadCompletionListener, DownloadOutcome,
    DownloadProgressListener,
};
use super::request::DownloadRequest;
use super::{BatchReport, FileDownloader};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;

pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// Queued, pooled HTTP(S) downloader.
///
/// Requests accumulate through [`FileDownloader::enqueue`] and are fetched
/// as one batch by [`FileDownloader::download`]. At most `concurrency`
/// transfers run at once.
pub struct HttpDownloader {
    client: Client,
    queue: Mutex<Vec<DownloadRequest>>,
    active_batches: AtomicUsize,
    closed: AtomicBool,
    concurrency: usize,
    workers: Arc<Semaphore>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    shutdown_grace: Duration,
    progress: Option<Arc<dyn DownloadProgressListener>>,
    completion: Option<Arc<dyn DownloadCompletionListener>>,
}

impl HttpDownloader {
    pub fn new() -> LauncherResult<Self> {
        Ok(Self::with_client(build_http_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            queue: Mutex::new(Vec::new()),
            active_batches: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            concurrency: DEFAULT_CONCURRENCY,
            workers: Arc::new(Semaphore::new(DEFAULT_CONCURRENCY)),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            progress: None,
            completion: None,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> LauncherResult<Self> {
        if n == 0 {
            return Err(LauncherError::config("concurrency", "must be greater than zero"));
        }
        self.concurrency = n;
        self.workers = Arc::new(Semaphore::new(n));
        Ok(self)
    }

    pub fn with_progress_listener(
        mut self,
        listener: impl DownloadProgressListener + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(listener));
        self
    }

    pub fn with_completion_listener(
        mut self,
        listener: impl DownloadCompletionListener + 'static,
    ) -> Self {
        self.completion = Some(Arc::new(listener));
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn pending(&self) -> usize {
        self.lock_queue().len()
    }

    fn lock_queue(&self) -> MutexGuard<'_, Vec<DownloadRequest>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_open(&self) -> LauncherResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LauncherError::config("downloader", "is closed"));
        }
        Ok(())
    }

    fn ensure_supported(&self, request: &DownloadRequest) -> LauncherResult<()> {
        if self.can_handle(request) {
            Ok(())
        } else {
            Err(LauncherError::UnsupportedDownloadRequest {
                url: request.source().to_string(),
            })
        }
    }

    fn spawn_attempt(
        &self,
        tasks: &mut JoinSet<(DownloadRequest, DownloadOutcome)>,
        request: DownloadRequest,
        cancel: CancellationToken,
    ) {
        let client = self.client.clone();
        let workers = Arc::clone(&self.workers);
        let shutdown = self.shutdown.clone();
        let progress = self.progress.clone();
        let completion = self.completion.clone();

        tasks.spawn(self.tracker.track_future(async move {
            let started = Instant::now();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(interrupted(&request)),
                _ = shutdown.cancelled() => Err(interrupted(&request)),
                result = async {
                    match workers.acquire_owned().await {
                        Ok(_permit) => transfer(&client, &request, progress.as_deref()).await,
                        Err(_) => Err(interrupted(&request)),
                    }
                } => result,
            };

            let outcome = match result {
                Ok(bytes) => {
                    debug!("Downloaded: {} ({} bytes)", request, bytes);
                    DownloadOutcome::Succeeded {
                        elapsed: started.elapsed(),
                        bytes,
                    }
                }
                Err(e) => {
                    discard_partial(&request).await;
                    warn!("Download failed: {}: {}", request, e);
                    DownloadOutcome::Failed(e)
                }
            };

            if let Some(listener) = completion.as_deref() {
                notify_completion(listener, &request, &outcome);
            }
            (request, outcome)
        }));
    }
}

#[async_trait]
impl FileDownloader for HttpDownloader {
    fn can_handle(&self, request: &DownloadRequest) -> bool {
        SUPPORTED_SCHEMES.contains(&request.scheme())
    }

    fn is_busy(&self) -> bool {
        self.active_batches.load(Ordering::Acquire) > 0
    }

    fn enqueue(&self, request: DownloadRequest) -> LauncherResult<()> {
        self.ensure_open()?;
        self.ensure_supported(&request)?;
        self.lock_queue().push(request);
        Ok(())
    }

    fn enqueue_all(&self, requests: Vec<DownloadRequest>) -> LauncherResult<()> {
        self.ensure_open()?;
        for request in &requests {
            self.ensure_supported(request)?;
        }
        self.lock_queue().extend(requests);
        Ok(())
    }

    async fn download_until(&self, cancel: &CancellationToken) -> LauncherResult<BatchReport> {
        self.ensure_open()?;

        // Snapshot: requests enqueued from here on wait for the next batch.
        let batch = std::mem::take(&mut *self.lock_queue());
        if batch.is_empty() {
            return Ok(BatchReport::default());
        }

        let _busy = BusyGuard::enter(&self.active_batches);
        info!(
            "Starting batch download: {} files, concurrency={}",
            batch.len(),
            self.concurrency
        );

        let mut tasks = JoinSet::new();
        for request in batch {
            self.spawn_attempt(&mut tasks, request, cancel.clone());
        }

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((request, DownloadOutcome::Succeeded { elapsed, bytes })) => {
                    report.succeeded.push((request, elapsed, bytes))
                }
                Ok((request, DownloadOutcome::Failed(e))) => report.failed.push((request, e)),
                Err(e) => warn!("Download task aborted: {}", e),
            }
        }

        info!(
            "Batch finished: {} succeeded, {} failed",
            report.succeeded.len(),
            report.failed.len()
        );

        if cancel.is_cancelled() || self.shutdown.is_cancelled() {
            return Err(LauncherError::BatchInterrupted {
                failed: report.failed.len(),
                report: Box::new(report),
            });
        }
        Ok(report)
    }

    async fn close(&self) -> LauncherResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.lock_queue().clear();
        self.tracker.close();

        if tokio::time::timeout(self.shutdown_grace, self.tracker.wait())
            .await
            .is_err()
        {
            warn!(
                "Downloads still running after {:?}, forcing shutdown",
                self.shutdown_grace
            );
            self.shutdown.cancel();
            if tokio::time::timeout(self.shutdown_grace, self.tracker.wait())
                .await
                .is_err()
            {
                return Err(LauncherError::ShutdownTimeout {
                    grace: self.shutdown_grace,
                });
            }
        }

        self.workers.close();
        debug!("Downloader closed");
        Ok(())
    }
}

// ── Transfer ────────────────────────────────────────

/// Streams one response body into `<destination>.part`, renaming it into
/// place once the body is complete. Returns the number of bytes written.
async fn transfer(
    client: &Client,
    request: &DownloadRequest,
    progress: Option<&dyn DownloadProgressListener>,
) -> LauncherResult<u64> {
    let destination = request.destination();
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let response = client
        .get(request.source().clone())
        .timeout(request.timeout())
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(LauncherError::DownloadFailed {
            url: request.source().to_string(),
            status: status.as_u16(),
        });
    }

    let total_bytes = response.content_length();
    let part = request.partial_destination();
    let io_err = |e: std::io::Error| LauncherError::Io {
        path: part.clone(),
        source: e,
    };

    let mut bytes_read = 0u64;
    // Scoped so the handle is released before the rename (Windows holds locks).
    {
        let mut file = tokio::fs::File::create(&part).await.map_err(io_err)?;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            file.write_all(&chunk).await.map_err(io_err)?;
            bytes_read += chunk.len() as u64;
            if let Some(listener) = progress {
                notify_progress(listener, request, bytes_read, total_bytes);
            }
        }
        file.flush().await.map_err(io_err)?;
    }

    tokio::fs::rename(&part, destination)
        .await
        .map_err(|e| LauncherError::Io {
            path: destination.to_path_buf(),
            source: e,
        })?;
    Ok(bytes_read)
}

async fn discard_partial(request: &DownloadRequest) {
    let part = request.partial_destination();
    match tokio::fs::remove_file(&part).await {
        Ok(()) => debug!("Removed partial file {:?}", part),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial file {:?}: {}", part, e),
    }
}

fn interrupted(request: &DownloadRequest) -> LauncherError {
    LauncherError::Interrupted {
        url: request.source().to_string(),
    }
}

/// Marks the downloader busy for the lifetime of a batch.
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
