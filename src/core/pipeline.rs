// ─── Provisioning Pipeline ───
// Resolves a client manifest to local files: filter, fetch, verify.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::core::client::ClientConfiguration;
use crate::core::condition::ConditionEvaluator;
use crate::core::downloader::{
    download_with_retries, DownloadRequest, FileDownloader, HttpDownloader, DEFAULT_RETRIES,
    DEFAULT_TIMEOUT,
};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::integrity::{IntegrityVerifier, Verification};
use crate::core::resource::{Downloadable, Resource, MAVEN_CENTRAL};
use crate::core::settings::LauncherSettings;

/// Local files backing a provisioned manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionedBundle {
    pub artifacts: Vec<PathBuf>,
    pub natives: Vec<PathBuf>,
    /// How many files had to be fetched.
    pub downloaded: usize,
}

impl ProvisionedBundle {
    pub fn classpath_entries(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Distinct directories holding native libraries.
    pub fn native_directories(&self) -> BTreeSet<PathBuf> {
        self.natives
            .iter()
            .filter_map(|path| path.parent().map(Path::to_path_buf))
            .collect()
    }
}

struct PlannedResource {
    resource: Resource,
    local: PathBuf,
}

pub struct Provisioner {
    libraries_dir: PathBuf,
    repository: String,
    evaluator: ConditionEvaluator,
    downloaders: Vec<Box<dyn FileDownloader>>,
    request_timeout: Duration,
    request_retries: u32,
}

impl Provisioner {
    pub fn new(libraries_dir: impl Into<PathBuf>, evaluator: ConditionEvaluator) -> Self {
        Self {
            libraries_dir: libraries_dir.into(),
            repository: MAVEN_CENTRAL.to_string(),
            evaluator,
            downloaders: Vec::new(),
            request_timeout: DEFAULT_TIMEOUT,
            request_retries: DEFAULT_RETRIES,
        }
    }

    /// Libraries directory, request defaults and an HTTP downloader taken
    /// from `settings`.
    pub fn from_settings(
        settings: &LauncherSettings,
        evaluator: ConditionEvaluator,
    ) -> LauncherResult<Self> {
        settings.validate()?;
        Ok(Self::new(&settings.libraries_dir, evaluator)
            .with_request_defaults(settings.download_timeout(), settings.download_retries)
            .with_downloader(settings.build_downloader()?))
    }

    /// Single HTTP(S) transport with default settings.
    pub fn with_http(
        libraries_dir: impl Into<PathBuf>,
        evaluator: ConditionEvaluator,
    ) -> LauncherResult<Self> {
        Ok(Self::new(libraries_dir, evaluator).with_downloader(HttpDownloader::new()?))
    }

    /// Transports are tried in registration order.
    pub fn with_downloader(mut self, downloader: impl FileDownloader + 'static) -> Self {
        self.downloaders.push(Box::new(downloader));
        self
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    pub fn with_request_defaults(mut self, timeout: Duration, retries: u32) -> Self {
        self.request_timeout = timeout;
        self.request_retries = retries;
        self
    }

    pub fn libraries_dir(&self) -> &Path {
        &self.libraries_dir
    }

    pub async fn provision(&self, config: &ClientConfiguration) -> LauncherResult<ProvisionedBundle> {
        self.provision_until(config, &CancellationToken::new()).await
    }

    /// Artifacts first, then the native libraries that apply here. Files
    /// already present and intact are reused.
    #[instrument(skip_all, fields(client = config.name()))]
    pub async fn provision_until(
        &self,
        config: &ClientConfiguration,
        cancel: &CancellationToken,
    ) -> LauncherResult<ProvisionedBundle> {
        let plan = self.plan(config)?;
        info!("Provisioning {} resources", plan.len());

        let mut missing = Vec::new();
        for entry in &plan {
            if self.is_intact(entry).await? {
                debug!("Reusing {:?}", entry.local);
            } else {
                missing.push(entry);
            }
        }

        if !missing.is_empty() {
            self.fetch(&missing, cancel).await?;
            for entry in &missing {
                self.verify_fetched(entry).await?;
            }
        }

        let mut bundle = ProvisionedBundle {
            downloaded: missing.len(),
            ..ProvisionedBundle::default()
        };
        for entry in plan {
            if entry.resource.is_native() {
                bundle.natives.push(entry.local);
            } else {
                bundle.artifacts.push(entry.local);
            }
        }
        info!(
            "Provisioned {} artifacts and {} natives ({} downloaded)",
            bundle.artifacts.len(),
            bundle.natives.len(),
            bundle.downloaded
        );
        Ok(bundle)
    }

    fn plan(&self, config: &ClientConfiguration) -> LauncherResult<Vec<PlannedResource>> {
        let natives = self
            .evaluator
            .filter(config.native_libraries().into_iter().cloned())?;

        let resources = config
            .artifacts()
            .iter()
            .cloned()
            .map(Resource::from)
            .chain(natives.into_iter().map(Resource::from));

        Ok(resources
            .map(|resource| PlannedResource {
                local: self.libraries_dir.join(resource.local_path()),
                resource,
            })
            .collect())
    }

    fn source_of(&self, resource: &Resource) -> LauncherResult<reqwest::Url> {
        match resource {
            Resource::Artifact(artifact) => artifact.source_uri_in(&self.repository),
            Resource::NativeLibrary(_) => resource.source_uri(),
        }
    }

    /// Present and matching every declared checksum. A present file without
    /// declared checksums counts as intact.
    async fn is_intact(&self, entry: &PlannedResource) -> LauncherResult<bool> {
        if !tokio::fs::try_exists(&entry.local).await.unwrap_or(false) {
            return Ok(false);
        }
        match IntegrityVerifier::verify_file_async(entry.local.clone(), entry.resource.clone())
            .await
        {
            Ok(_) => Ok(true),
            Err(e @ (LauncherError::ChecksumMismatch { .. } | LauncherError::HashMismatch { .. })) => {
                warn!("Refetching corrupt file: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn verify_fetched(&self, entry: &PlannedResource) -> LauncherResult<()> {
        let result =
            IntegrityVerifier::verify_file_async(entry.local.clone(), entry.resource.clone()).await;
        match result {
            Ok(Verification::Verified { checks }) => {
                debug!("Verified {:?} ({} checks)", entry.local, checks);
                Ok(())
            }
            Ok(Verification::Unverifiable) => Ok(()),
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&entry.local).await {
                    warn!("Could not remove rejected file {:?}: {}", entry.local, rm);
                }
                Err(e)
            }
        }
    }

    /// Routes every request before queueing any, then drains one transport
    /// at a time. Nothing stays queued when this returns an error.
    async fn fetch(
        &self,
        missing: &[&PlannedResource],
        cancel: &CancellationToken,
    ) -> LauncherResult<()> {
        let mut routed: Vec<Vec<DownloadRequest>> = vec![Vec::new(); self.downloaders.len()];
        for entry in missing {
            let request = DownloadRequest::new(
                self.source_of(&entry.resource)?,
                &entry.local,
                self.request_timeout,
                self.request_retries,
            )?;
            let index = self
                .downloaders
                .iter()
                .position(|d| d.can_handle(&request))
                .ok_or_else(|| LauncherError::UnsupportedDownloadRequest {
                    url: request.source().to_string(),
                })?;
            routed[index].push(request);
        }

        for (downloader, requests) in self.downloaders.iter().zip(routed) {
            if requests.is_empty() {
                continue;
            }
            downloader.enqueue_all(requests)?;
            download_with_retries(&**downloader, cancel)
                .await?
                .into_result()?;
        }
        Ok(())
    }

    /// Closes every registered transport.
    pub async fn close(&self) -> LauncherResult<()> {
        for downloader in &self.downloaders {
            downloader.close().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use tempfile::TempDir;

    use super::*;
    use crate::core::condition::EnvironmentContext;
    use crate::core::integrity::{checksum_to_hex, ChecksumAlgorithm, ChecksumCalculator};
    use crate::core::resource::RemoteNativeLibrary;

    const JAR: &[u8] = b"PK\x03\x04 fake jar";
    const NATIVE: &[u8] = b"\x7fELF fake native";

    fn manifest(server: &MockServer, native_crc: u64) -> ClientConfiguration {
        let json = format!(
            r#"{{
                "name": "Test Client",
                "artifacts": [{{
                    "type": "maven",
                    "group_id": "net.example",
                    "artifact_id": "client",
                    "version": "1.0.0",
                    "dependencies": [
                        {{
                            "type": "remote",
                            "source_uri": "{linux}",
                            "checksums": {{ "crc32": "0x{crc}" }},
                            "conditions": {{ "os.name.contains": "Linux" }}
                        }},
                        {{
                            "type": "remote",
                            "source_uri": "{windows}",
                            "conditions": {{ "os.name.contains": "Windows" }}
                        }}
                    ]
                }}]
            }}"#,
            linux = server.url("/natives/linux/libclient.so"),
            windows = server.url("/natives/windows/client.dll"),
            crc = checksum_to_hex(native_crc),
        );
        ClientConfiguration::from_json(&json).unwrap()
    }

    fn linux() -> ConditionEvaluator {
        ConditionEvaluator::with_default_validators(EnvironmentContext::new([
            ("os.name", "Linux"),
            ("cpu.architecture", "amd64"),
        ]))
    }

    fn native_crc() -> u64 {
        ChecksumCalculator::new(ChecksumAlgorithm::Crc32).calculate(NATIVE)
    }

    async fn serve(server: &MockServer) -> (httpmock::Mock<'_>, httpmock::Mock<'_>) {
        let jar = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/maven/net/example/client/1.0.0/client-1.0.0.jar");
                then.status(200).body(JAR);
            })
            .await;
        let native = server
            .mock_async(|when, then| {
                when.method(GET).path("/natives/linux/libclient.so");
                then.status(200).body(NATIVE);
            })
            .await;
        (jar, native)
    }

    #[tokio::test]
    async fn fetches_applicable_resources_then_reuses_them() {
        let server = MockServer::start_async().await;
        let (jar, native) = serve(&server).await;
        let libs = TempDir::new().unwrap();
        let provisioner = Provisioner::with_http(libs.path(), linux())
            .unwrap()
            .with_repository(server.url("/maven"));
        let config = manifest(&server, native_crc());

        let bundle = provisioner.provision(&config).await.unwrap();
        assert_eq!(bundle.downloaded, 2);
        assert_eq!(bundle.artifacts.len(), 1);
        assert_eq!(bundle.natives.len(), 1);
        assert_eq!(std::fs::read(&bundle.artifacts[0]).unwrap(), JAR);
        assert_eq!(std::fs::read(&bundle.natives[0]).unwrap(), NATIVE);
        assert_eq!(bundle.native_directories().len(), 1);

        let again = provisioner.provision(&config).await.unwrap();
        assert_eq!(again.downloaded, 0);
        assert_eq!(again, ProvisionedBundle { downloaded: 0, ..bundle });
        jar.assert_hits_async(1).await;
        native.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn checksum_mismatch_after_fetch_fails_and_removes_file() {
        let server = MockServer::start_async().await;
        serve(&server).await;
        let libs = TempDir::new().unwrap();
        let provisioner = Provisioner::with_http(libs.path(), linux())
            .unwrap()
            .with_repository(server.url("/maven"));
        let config = manifest(&server, 0xDEADBEEF);

        let err = provisioner.provision(&config).await.unwrap_err();
        assert!(matches!(err, LauncherError::ChecksumMismatch { .. }));
        let native =
            RemoteNativeLibrary::parse(&server.url("/natives/linux/libclient.so")).unwrap();
        assert!(!libs.path().join(native.local_path()).exists());
    }

    #[tokio::test]
    async fn missing_environment_property_aborts_before_fetching() {
        let server = MockServer::start_async().await;
        let (jar, _) = serve(&server).await;
        let libs = TempDir::new().unwrap();
        let evaluator = ConditionEvaluator::with_default_validators(EnvironmentContext::default());
        let provisioner = Provisioner::with_http(libs.path(), evaluator)
            .unwrap()
            .with_repository(server.url("/maven"));

        let err = provisioner
            .provision(&manifest(&server, native_crc()))
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::NoSuchProperty { .. }));
        jar.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn no_transport_for_scheme_is_unsupported() {
        let server = MockServer::start_async().await;
        let libs = TempDir::new().unwrap();
        let provisioner = Provisioner::new(libs.path(), linux()).with_repository(server.url("/maven"));
        let err = provisioner
            .provision(&manifest(&server, native_crc()))
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::UnsupportedDownloadRequest { .. }));
    }

    fn single_artifact(name: &str, natives: &str) -> ClientConfiguration {
        ClientConfiguration::from_json(&format!(
            r#"{{
                "artifacts": [{{
                    "type": "maven",
                    "group_id": "net.example",
                    "artifact_id": "{name}",
                    "version": "1.0.0",
                    "dependencies": [{natives}]
                }}]
            }}"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn failed_routing_leaves_nothing_queued_for_the_next_run() {
        let server = MockServer::start_async().await;
        let first = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/maven/net/example/first/1.0.0/first-1.0.0.jar");
                then.status(200).body(JAR);
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/maven/net/example/second/1.0.0/second-1.0.0.jar");
                then.status(200).body(JAR);
            })
            .await;
        let libs = TempDir::new().unwrap();
        let provisioner = Provisioner::with_http(libs.path(), linux())
            .unwrap()
            .with_repository(server.url("/maven"));

        let unroutable = single_artifact(
            "first",
            r#"{ "type": "remote", "source_uri": "ftp://example.com/libfirst.so" }"#,
        );
        let err = provisioner.provision(&unroutable).await.unwrap_err();
        assert!(matches!(err, LauncherError::UnsupportedDownloadRequest { .. }));

        let bundle = provisioner
            .provision(&single_artifact("second", ""))
            .await
            .unwrap();
        assert_eq!(bundle.downloaded, 1);
        first.assert_hits_async(0).await;
        second.assert_hits_async(1).await;
        assert!(!libs
            .path()
            .join("net/example/first/1.0.0/first-1.0.0.jar")
            .exists());
    }

    #[tokio::test]
    async fn failed_batch_does_not_leak_into_the_next_run() {
        let server = MockServer::start_async().await;
        let broken = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/maven/net/example/first/1.0.0/first-1.0.0.jar");
                then.status(500);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/maven/net/example/second/1.0.0/second-1.0.0.jar");
                then.status(200).body(JAR);
            })
            .await;
        let libs = TempDir::new().unwrap();
        let provisioner = Provisioner::with_http(libs.path(), linux())
            .unwrap()
            .with_repository(server.url("/maven"));

        let err = provisioner
            .provision(&single_artifact("first", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::DownloadFailed { status: 500, .. }));

        provisioner
            .provision(&single_artifact("second", ""))
            .await
            .unwrap();
        broken.assert_hits_async(1).await;
    }
}
