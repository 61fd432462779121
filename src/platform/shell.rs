//! Local command execution

use crate::core::CommandRunner;
use crate::utils::ProbeError;
use async_trait::async_trait;
use std::process::{Command, Output};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

/// PowerShell executable for this host
pub fn powershell_program() -> &'static str {
    if cfg!(windows) {
        "powershell.exe"
    } else {
        "pwsh"
    }
}

/// Runs commands on the local host
///
/// Each call spawns a process on the blocking pool. A non-zero exit status
/// is an error carrying the process's stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalShell;

impl LocalShell {
    fn shell_command(command: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd.creation_flags(crate::constants::CREATE_NO_WINDOW);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }

    fn powershell_command(script: &str) -> Command {
        let mut cmd = Command::new(powershell_program());
        cmd.arg("-NoProfile")
            .arg("-NonInteractive")
            .arg("-Command")
            .arg(script);

        #[cfg(windows)]
        cmd.creation_flags(crate::constants::CREATE_NO_WINDOW);

        cmd
    }

    async fn capture(mut cmd: Command, label: String) -> Result<String, ProbeError> {
        let output = tokio::task::spawn_blocking(move || cmd.output())
            .await
            .map_err(|e| ProbeError::Exec(format!("Task execution failed: {}", e)))?
            .map_err(|e| ProbeError::Exec(format!("Failed to spawn '{}': {}", label, e)))?;
        Self::stdout_or_error(output, &label)
    }

    fn stdout_or_error(output: Output, label: &str) -> Result<String, ProbeError> {
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = match stderr.trim() {
            "" => format!("exited with {}", output.status),
            msg => msg.to_string(),
        };
        Err(ProbeError::Exec(format!("'{}' failed: {}", label, detail)))
    }
}

#[async_trait]
impl CommandRunner for LocalShell {
    async fn run(&self, command: &str) -> Result<String, ProbeError> {
        Self::capture(Self::shell_command(command), command.to_string()).await
    }

    async fn run_powershell(&self, script: &str) -> Result<String, ProbeError> {
        let label = format!("{} script", powershell_program());
        Self::capture(Self::powershell_command(script), label).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let out = LocalShell.run("echo hello").await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn pipelines_run_through_the_shell() {
        let out = LocalShell
            .run("printf 'a\\ndefault x\\n' | grep default")
            .await
            .unwrap();
        assert_eq!(out.trim(), "default x");
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_error() {
        let err = LocalShell.run("echo oops >&2; exit 3").await.unwrap_err();
        assert!(err.to_string().contains("oops"));

        let err = LocalShell.run("exit 1").await.unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }
}
