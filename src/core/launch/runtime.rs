use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::core::error::{LauncherError, LauncherResult};

const VERSION_ARGUMENT: &str = "-version";
const VERSION_PATTERN: &str = r#"version\s+"([^"]+)""#;
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// A validated runtime executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeDescriptor {
    executable: PathBuf,
    probe_timeout: Duration,
}

impl RuntimeDescriptor {
    /// Fails unless `executable` exists, is a regular file and is executable.
    pub fn new(executable: impl Into<PathBuf>) -> LauncherResult<Self> {
        let executable = executable.into();
        let invalid = |reason: &str| LauncherError::InvalidRuntime {
            path: absolute(&executable),
            reason: reason.to_string(),
        };

        let metadata = std::fs::metadata(&executable).map_err(|_| invalid("not found"))?;
        if !metadata.is_file() {
            return Err(invalid("not a regular file"));
        }
        if !is_executable(&metadata) {
            return Err(invalid("not executable"));
        }

        Ok(Self {
            executable,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        })
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// The executable followed by `arguments`.
    pub fn create_command_line<I, S>(&self, arguments: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        std::iter::once(self.executable.as_os_str().to_os_string())
            .chain(arguments.into_iter().map(Into::into))
            .collect()
    }

    /// A command for the executable with `arguments` already applied.
    pub fn command<I, S>(&self, arguments: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut command_line = self.create_command_line(arguments).into_iter();
        let mut cmd = Command::new(command_line.next().unwrap_or_default());
        cmd.args(command_line);
        cmd
    }

    /// Runs the executable with `-version` and extracts the quoted version
    /// token from its combined output.
    #[instrument(skip(self), fields(executable = ?self.executable))]
    pub async fn get_version(&self) -> LauncherResult<String> {
        let mut cmd = self.command([VERSION_ARGUMENT]);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| LauncherError::ProcessSpawn {
            program: self.executable.clone(),
            source: e,
        })?;

        // Dropping the pending wait kills the probe.
        let output = match tokio::time::timeout(self.probe_timeout, child.wait_with_output()).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(LauncherError::ProcessTimeout {
                    timeout: self.probe_timeout,
                })
            }
        };

        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let combined = combined.trim().to_string();
        debug!("Version probe output: {}", combined.lines().next().unwrap_or(""));

        if !output.status.success() {
            return Err(LauncherError::ProcessExecution {
                exit_code: output.status.code().unwrap_or(-1),
                output: combined,
            });
        }

        parse_version(&combined)
    }
}

fn parse_version(output: &str) -> LauncherResult<String> {
    let pattern = Regex::new(VERSION_PATTERN)
        .map_err(|e| LauncherError::config("version_pattern", e.to_string()))?;
    pattern
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| LauncherError::VersionParse {
            output: output.to_string(),
        })
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writes an executable shell script into `dir`.
    #[cfg(unix)]
    pub(crate) fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn parses_modern_and_legacy_version_lines() {
        assert_eq!(
            parse_version(r#"openjdk version "21.0.2" 2024-01-16"#).unwrap(),
            "21.0.2"
        );
        assert_eq!(
            parse_version("java version \"1.8.0_442\"\nJava(TM) SE Runtime").unwrap(),
            "1.8.0_442"
        );
        assert!(matches!(
            parse_version("no version here"),
            Err(LauncherError::VersionParse { .. })
        ));
    }

    #[test]
    fn rejects_missing_and_directory_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            RuntimeDescriptor::new(dir.path().join("java")),
            Err(LauncherError::InvalidRuntime { .. })
        ));
        assert!(matches!(
            RuntimeDescriptor::new(dir.path()),
            Err(LauncherError::InvalidRuntime { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_non_executable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("java");
        std::fs::write(&path, "").unwrap();
        let err = RuntimeDescriptor::new(&path).unwrap_err();
        assert!(err.to_string().contains("not executable"));
    }

    #[cfg(unix)]
    #[test]
    fn command_line_starts_with_executable() {
        let dir = tempfile::tempdir().unwrap();
        let java = script(dir.path(), "java", "exit 0");
        let runtime = RuntimeDescriptor::new(&java).unwrap();
        let argv = runtime.create_command_line(["-cp", "a.jar", "Main"]);
        assert_eq!(argv.len(), 4);
        assert_eq!(argv[0], java.as_os_str());
        assert_eq!(argv[3], "Main");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_reads_version_from_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let java = script(
            dir.path(),
            "java",
            r#"echo 'openjdk version "17.0.9" 2023-10-17' >&2"#,
        );
        let runtime = RuntimeDescriptor::new(java).unwrap();
        assert_eq!(runtime.get_version().await.unwrap(), "17.0.9");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_reports_exit_code_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let java = script(dir.path(), "java", "echo broken; exit 3");
        let runtime = RuntimeDescriptor::new(java).unwrap();
        match runtime.get_version().await {
            Err(LauncherError::ProcessExecution { exit_code, output }) => {
                assert_eq!(exit_code, 3);
                assert_eq!(output, "broken");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let java = script(dir.path(), "java", "sleep 5");
        let runtime = RuntimeDescriptor::new(java)
            .unwrap()
            .with_probe_timeout(Duration::from_millis(200));
        match runtime.get_version().await {
            Err(LauncherError::ProcessTimeout { timeout }) => {
                assert_eq!(timeout, Duration::from_millis(200))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
