use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;

use crate::core::error::{LauncherError, LauncherResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_RETRIES: u32 = 1;

/// A single file to fetch.
///
/// `retries` is the total number of attempts the caller may make; the
/// downloader itself makes exactly one attempt per batch.
///
/// Two requests must not target the same destination within one batch.
/// This is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadRequest {
    source: Url,
    destination: PathBuf,
    timeout: Duration,
    retries: u32,
}

impl DownloadRequest {
    pub fn new(
        source: Url,
        destination: impl Into<PathBuf>,
        timeout: Duration,
        retries: u32,
    ) -> LauncherResult<Self> {
        if timeout.is_zero() {
            return Err(LauncherError::config("timeout", "must be greater than zero"));
        }
        if retries < 1 {
            return Err(LauncherError::config("retries", "must be greater than zero"));
        }
        Ok(Self {
            source,
            destination: destination.into(),
            timeout,
            retries,
        })
    }

    /// Request with the default timeout and a single attempt.
    pub fn with_defaults(source: Url, destination: impl Into<PathBuf>) -> Self {
        Self {
            source,
            destination: destination.into(),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        }
    }

    pub fn parse(source: &str, destination: impl Into<PathBuf>) -> LauncherResult<Self> {
        let url = Url::parse(source.trim())
            .map_err(|e| LauncherError::config("source", format!("{source}: {e}")))?;
        Ok(Self::with_defaults(url, destination))
    }

    pub fn source(&self) -> &Url {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Lower-cased transport scheme.
    pub fn scheme(&self) -> &str {
        self.source.scheme()
    }

    /// Where bytes land until the transfer completes.
    pub fn partial_destination(&self) -> PathBuf {
        match self.destination.file_name() {
            Some(name) => {
                let mut part = name.to_os_string();
                part.push(".part");
                self.destination.with_file_name(part)
            }
            None => self.destination.with_extension("part"),
        }
    }
}

impl fmt::Display for DownloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {:?}", self.source, self.destination)
    }
}
