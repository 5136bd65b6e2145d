use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::downloader::{HttpDownloader, DEFAULT_CONCURRENCY, DEFAULT_RETRIES, DEFAULT_TIMEOUT};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::RuntimeDescriptor;

const APP_DIR_NAME: &str = "bundle-launcher";

/// Launcher-wide knobs, read from a JSON file. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    pub download_concurrency: usize,
    pub download_timeout_secs: u64,
    pub download_retries: u32,
    pub libraries_dir: PathBuf,
    pub runtime_path: Option<PathBuf>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            download_concurrency: DEFAULT_CONCURRENCY,
            download_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            download_retries: DEFAULT_RETRIES,
            libraries_dir: default_data_dir().join("libraries"),
            runtime_path: None,
        }
    }
}

impl LauncherSettings {
    /// Reads settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> LauncherResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(LauncherError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        let settings: Self = serde_json::from_str(&raw)?;
        settings.validate()?;
        info!("Loaded launcher settings from {:?}", path);
        Ok(settings)
    }

    pub fn validate(&self) -> LauncherResult<()> {
        if self.download_concurrency == 0 {
            return Err(LauncherError::config("download_concurrency", "must be greater than zero"));
        }
        if self.download_timeout_secs == 0 {
            return Err(LauncherError::config("download_timeout_secs", "must be greater than zero"));
        }
        if self.download_retries == 0 {
            return Err(LauncherError::config("download_retries", "must be greater than zero"));
        }
        Ok(())
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn build_downloader(&self) -> LauncherResult<HttpDownloader> {
        HttpDownloader::new()?.with_concurrency(self.download_concurrency)
    }

    /// The configured runtime, validated; `None` when unset.
    pub fn runtime(&self) -> LauncherResult<Option<RuntimeDescriptor>> {
        self.runtime_path
            .as_deref()
            .map(RuntimeDescriptor::new)
            .transpose()
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LauncherSettings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, LauncherSettings::default());
        assert_eq!(settings.download_concurrency, 1);
        assert_eq!(settings.download_timeout(), Duration::from_secs(300));
        assert!(settings.libraries_dir.ends_with("bundle-launcher/libraries"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "download_concurrency": 4, "libraries_dir": "/srv/libs" }"#)
            .unwrap();
        let settings = LauncherSettings::load(&path).unwrap();
        assert_eq!(settings.download_concurrency, 4);
        assert_eq!(settings.libraries_dir, PathBuf::from("/srv/libs"));
        assert_eq!(settings.download_retries, DEFAULT_RETRIES);
        assert!(settings.runtime().unwrap().is_none());
    }

    #[test]
    fn zero_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "download_retries": 0 }"#).unwrap();
        assert!(LauncherSettings::load(&path).is_err());
    }

    #[test]
    fn invalid_runtime_path_surfaces() {
        let settings = LauncherSettings {
            runtime_path: Some(PathBuf::from("/definitely/not/java")),
            ..LauncherSettings::default()
        };
        assert!(matches!(
            settings.runtime(),
            Err(LauncherError::InvalidRuntime { .. })
        ));
    }
}
