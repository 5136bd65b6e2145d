use std::process::ExitStatus;

use chrono::{DateTime, Utc};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tracing::{info, warn};

use super::{ClientConfiguration, PlayerConfiguration};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::{ApplicationLaunchConfiguration, ProcessExecutor};
use crate::core::preprocess::Preprocessor;

/// A running client: the configurations it was started from and its process.
#[derive(Debug)]
pub struct Client {
    client_configuration: ClientConfiguration,
    player_configuration: PlayerConfiguration,
    launch_configuration: ApplicationLaunchConfiguration,
    process: Child,
    started_at: DateTime<Utc>,
}

impl Client {
    /// Wraps an already spawned process. Fails if it has exited.
    pub fn new(
        client_configuration: ClientConfiguration,
        player_configuration: PlayerConfiguration,
        launch_configuration: ApplicationLaunchConfiguration,
        mut process: Child,
    ) -> LauncherResult<Self> {
        if let Some(status) = process.try_wait()? {
            return Err(LauncherError::config(
                "process",
                format!("must be running, already exited with {status}"),
            ));
        }
        Ok(Self {
            client_configuration,
            player_configuration,
            launch_configuration,
            process,
            started_at: Utc::now(),
        })
    }

    /// Substitutes player and client variables into the launch arguments,
    /// spawns the process and wraps it.
    pub fn launch(
        executor: &ProcessExecutor,
        client_configuration: ClientConfiguration,
        player_configuration: PlayerConfiguration,
        launch_configuration: ApplicationLaunchConfiguration,
        mut preprocessor: Preprocessor,
    ) -> LauncherResult<Self> {
        preprocessor.set_variables(player_configuration.variables());
        preprocessor.set_variables([
            ("client_name", client_configuration.name()),
            ("client_version", client_configuration.version()),
        ]);

        let resolved = launch_configuration
            .clone()
            .with_jvm_arguments(preprocessor.preprocess_all(launch_configuration.jvm_arguments()))
            .with_application_arguments(
                preprocessor.preprocess_all(launch_configuration.application_arguments()),
            );

        let process = executor.execute(&resolved)?;
        info!(
            "Started {} {} for {} (pid {:?})",
            client_configuration.name(),
            client_configuration.version(),
            player_configuration.user_name(),
            process.id()
        );
        Self::new(client_configuration, player_configuration, resolved, process)
    }

    pub fn client_configuration(&self) -> &ClientConfiguration {
        &self.client_configuration
    }

    pub fn player_configuration(&self) -> &PlayerConfiguration {
        &self.player_configuration
    }

    pub fn launch_configuration(&self) -> &ApplicationLaunchConfiguration {
        &self.launch_configuration
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    /// `None` once the process has been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.process.id()
    }

    pub fn is_alive(&mut self) -> bool {
        match self.process.try_wait() {
            Ok(status) => status.is_none(),
            Err(e) => {
                warn!("Could not poll client process: {}", e);
                false
            }
        }
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.process.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.process.stderr.take()
    }

    pub async fn wait(&mut self) -> LauncherResult<ExitStatus> {
        let status = self.process.wait().await?;
        info!("{} exited with {}", self.client_configuration.name(), status);
        Ok(status)
    }

    pub async fn kill(&mut self) -> LauncherResult<()> {
        self.process.kill().await?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::path::PathBuf;
    use std::process::Stdio;

    use tokio::io::AsyncReadExt;
    use tokio::process::Command;
    use uuid::Uuid;

    use super::*;
    use crate::core::launch::RuntimeDescriptor;
    use crate::core::resource::{Artifact, MavenArtifact};

    fn client_configuration() -> ClientConfiguration {
        let artifact = MavenArtifact::parse("net.example:client:1.0.0").unwrap();
        ClientConfiguration::new([Artifact::from(artifact)])
            .unwrap()
            .with_name("Beta")
    }

    fn launch_configuration() -> ApplicationLaunchConfiguration {
        ApplicationLaunchConfiguration::new("net.example.Main", vec![PathBuf::from("a.jar")])
            .unwrap()
    }

    fn player() -> PlayerConfiguration {
        PlayerConfiguration::new("Steve", Uuid::nil()).unwrap()
    }

    #[tokio::test]
    async fn exited_process_is_rejected() {
        let mut child = Command::new("sh").args(["-c", "exit 0"]).spawn().unwrap();
        child.wait().await.unwrap();
        let result = Client::new(client_configuration(), player(), launch_configuration(), child);
        assert!(matches!(
            result,
            Err(LauncherError::InvalidConfiguration { field: "process", .. })
        ));
    }

    #[tokio::test]
    async fn live_process_can_be_killed() {
        let child = Command::new("sh")
            .args(["-c", "sleep 30"])
            .stdout(Stdio::null())
            .spawn()
            .unwrap();
        let mut client =
            Client::new(client_configuration(), player(), launch_configuration(), child).unwrap();
        assert!(client.is_alive());
        assert!(client.pid().is_some());
        assert!(client.uptime() >= chrono::Duration::zero());

        client.kill().await.unwrap();
        let status = client.wait().await.unwrap();
        assert!(!status.success());
        assert!(!client.is_alive());
    }

    #[tokio::test]
    async fn launch_substitutes_variables() {
        let dir = tempfile::tempdir().unwrap();
        let java = crate::core::launch::test_script(dir.path(), "java", r#"echo "$@"; sleep 1"#);
        let executor = ProcessExecutor::new(RuntimeDescriptor::new(java).unwrap());
        let config = launch_configuration().with_application_arguments(vec![
            "--username".to_string(),
            "${user_name}".to_string(),
            "--client".to_string(),
            "${client_name}".to_string(),
            "${unknown}".to_string(),
        ]);

        let mut client = Client::launch(
            &executor,
            client_configuration(),
            player(),
            config,
            Preprocessor::new().unwrap(),
        )
        .unwrap();

        let mut stdout = client.take_stdout().unwrap();
        let mut output = String::new();
        stdout.read_to_string(&mut output).await.unwrap();
        assert_eq!(
            output.trim(),
            "-cp a.jar net.example.Main --username Steve --client Beta ${unknown}"
        );
        client.wait().await.unwrap();
    }
}
