pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::client::{Client, ClientConfiguration, PlayerConfiguration};
pub use crate::core::condition::{ConditionEvaluator, EnvironmentContext};
pub use crate::core::downloader::{DownloadRequest, FileDownloader, HttpDownloader};
pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::launch::{ApplicationLaunchConfiguration, ProcessExecutor, RuntimeDescriptor};
pub use crate::core::pipeline::{ProvisionedBundle, Provisioner};
pub use crate::core::settings::LauncherSettings;

/// Installs a fmt subscriber filtered by `RUST_LOG`.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bundle_launcher=debug")),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Tracing initialised");
    }
}
