// ─── Launch Task ───
// Spawns the application process with the assembled command line.

use std::ffi::OsString;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use super::classpath::build_classpath;
use super::config::ApplicationLaunchConfiguration;
use super::runtime::RuntimeDescriptor;
use crate::core::error::{LauncherError, LauncherResult};

const CLASSPATH_ARGUMENT: &str = "-cp";

/// Starts applications on one runtime.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    runtime: RuntimeDescriptor,
}

impl ProcessExecutor {
    pub fn new(runtime: RuntimeDescriptor) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &RuntimeDescriptor {
        &self.runtime
    }

    /// `[jvm args] -cp <classpath> <main class> [app args]`, without the
    /// executable.
    pub fn build_arguments(
        &self,
        config: &ApplicationLaunchConfiguration,
    ) -> LauncherResult<Vec<String>> {
        let classpath = build_classpath(config.classpath_entries())?;

        let mut args = config.jvm_arguments().to_vec();
        args.push(CLASSPATH_ARGUMENT.to_string());
        args.push(classpath);
        args.push(config.main_class().to_string());
        args.extend(config.application_arguments().iter().cloned());
        Ok(args)
    }

    /// Full argv, executable first.
    pub fn command_line(
        &self,
        config: &ApplicationLaunchConfiguration,
    ) -> LauncherResult<Vec<OsString>> {
        Ok(self.runtime.create_command_line(self.build_arguments(config)?))
    }

    /// Spawns the application with piped stdout/stderr.
    ///
    /// Returns immediately after spawning; the caller owns the child.
    pub fn execute(&self, config: &ApplicationLaunchConfiguration) -> LauncherResult<Child> {
        let mut cmd = self.runtime.command(self.build_arguments(config)?);
        if let Some(dir) = config.working_directory() {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        info!(
            "Launching {} with {:?}",
            config.main_class(),
            self.runtime.executable()
        );
        debug!("Command (copy/paste): {}", format_command_for_logs(&cmd));

        cmd.spawn().map_err(|e| LauncherError::ProcessSpawn {
            program: self.runtime.executable().to_path_buf(),
            source: e,
        })
    }
}

fn format_command_for_logs(cmd: &Command) -> String {
    let cmd = cmd.as_std();
    let program = shell_escape(&cmd.get_program().to_string_lossy());
    let args = cmd
        .get_args()
        .map(|arg| shell_escape(&arg.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
