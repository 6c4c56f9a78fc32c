//! Injected subprocess execution.
//!
//! The sync engine never spawns processes directly; it goes through the
//! [`ProcessRunner`] trait so the git plumbing can be exercised with a fake
//! runner in tests. [`SystemRunner`] is the production implementation.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

/// Captured result of one subprocess invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run an external program and capture its output.
///
/// Spawn failures surface as `io::Error`; a non-zero exit is not an error at
/// this layer, callers inspect [`CommandOutput::exit_code`].
pub trait ProcessRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> impl Future<Output = std::io::Result<CommandOutput>> + Send;
}

/// Production runner backed by `tokio::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> std::io::Result<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!(program, args = %args.join(" "), cwd = ?cwd.map(PathBuf::from), "running command");
        let output = cmd.output().await?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_runner_captures_stdout() {
        let runner = SystemRunner;
        let out = runner
            .run("echo", &["hello".to_string()], None)
            .await
            .expect("echo failed to spawn");
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_system_runner_missing_binary() {
        let runner = SystemRunner;
        let result = runner
            .run("definitely-not-a-real-binary-xyz", &[], None)
            .await;
        assert!(result.is_err());
    }
}
