use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::core::downloader::BatchReport;

/// Central error type for the provisioning and launch pipeline.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── Configuration ───────────────────────────────────
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    #[error("Invalid runtime executable {path:?}: {reason}")]
    InvalidRuntime { path: PathBuf, reason: String },

    #[error("Classpath entries list cannot be empty")]
    EmptyClasspath,

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Download request format is not supported: {url}")]
    UnsupportedDownloadRequest { url: String },

    #[error("Download of {url} was interrupted")]
    Interrupted { url: String },

    /// `report` holds what the batch settled before it was cut short.
    #[error("Download batch interrupted with {failed} request(s) not completed")]
    BatchInterrupted {
        failed: usize,
        report: Box<BatchReport>,
    },

    #[error("Downloader failed to terminate within {grace:?} after forced shutdown")]
    ShutdownTimeout { grace: Duration },

    // ── Integrity ───────────────────────────────────────
    #[error("No such algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("{algorithm} checksum mismatch for {path:?}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        algorithm: String,
        expected: String,
        actual: String,
    },

    #[error("{algorithm} hash mismatch for {path:?}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        algorithm: String,
        expected: String,
        actual: String,
    },

    // ── Conditions ──────────────────────────────────────
    #[error("Property \"{property}\" is empty or not defined in the environment context")]
    NoSuchProperty { property: String },

    // ── Process ─────────────────────────────────────────
    #[error("Failed to start {program:?}: {source}")]
    ProcessSpawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Process timed out after {timeout:?}")]
    ProcessTimeout { timeout: Duration },

    #[error("Process finished with exit code: {exit_code}, process output: {output}")]
    ProcessExecution { exit_code: i32, output: String },

    #[error("Failed to parse runtime version from process output: {output}")]
    VersionParse { output: String },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Shorthand for a configuration error on a named field.
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        LauncherError::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the error came from a cancelled download.
    pub fn is_interruption(&self) -> bool {
        matches!(
            self,
            LauncherError::Interrupted { .. } | LauncherError::BatchInterrupted { .. }
        )
    }
}
