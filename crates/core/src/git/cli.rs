//! Git CLI plumbing over an injected [`ProcessRunner`].
//!
//! Every operation the sync engine needs maps to one git subcommand. The
//! engine decides which failures are hard and which are tolerated; this layer
//! only converts non-zero exits into typed [`GitError`]s.

use std::path::Path;

use tracing::{debug, warn};

use crate::errors::GitError;
use crate::process::{CommandOutput, ProcessRunner};

/// Thin wrapper running `git` subcommands through a [`ProcessRunner`].
#[derive(Debug, Clone)]
pub struct GitCli<R> {
    runner: R,
}

impl<R: ProcessRunner> GitCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Clone `url` into `dest`.
    pub async fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitError> {
        self.git(None, &["clone", url, &dest.to_string_lossy()])
            .await?;
        Ok(())
    }

    /// Fetch all remotes of an existing working clone.
    pub async fn fetch_all(&self, repo: &Path) -> Result<(), GitError> {
        self.git(Some(repo), &["fetch", "--all"]).await?;
        Ok(())
    }

    /// Fetch a single named remote.
    pub async fn fetch_remote(&self, repo: &Path, remote: &str) -> Result<(), GitError> {
        self.git(Some(repo), &["fetch", remote]).await?;
        Ok(())
    }

    /// Remove a named remote. Absence is not an error; other failures are
    /// logged and swallowed so remote setup stays idempotent.
    pub async fn remote_remove(&self, repo: &Path, name: &str) {
        if let Err(e) = self.git(Some(repo), &["remote", "remove", name]).await {
            debug!(remote = name, error = %e, "remote remove skipped");
        }
    }

    /// Add a named remote pointing at `url`.
    pub async fn remote_add(&self, repo: &Path, name: &str, url: &str) -> Result<(), GitError> {
        self.git(Some(repo), &["remote", "add", name, url]).await?;
        Ok(())
    }

    /// Push all branches to a named remote.
    pub async fn push_all(&self, repo: &Path, remote: &str) -> Result<(), GitError> {
        self.git(Some(repo), &["push", remote, "--all"]).await?;
        Ok(())
    }

    /// Push all tags to a named remote.
    pub async fn push_tags(&self, repo: &Path, remote: &str) -> Result<(), GitError> {
        self.git(Some(repo), &["push", remote, "--tags"]).await?;
        Ok(())
    }

    async fn git(&self, cwd: Option<&Path>, args: &[&str]) -> Result<CommandOutput, GitError> {
        let owned: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let output = self
            .runner
            .run("git", &owned, cwd)
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GitError::BinaryNotFound
                } else {
                    GitError::Io(e)
                }
            })?;

        if !output.success() {
            let command = args.first().copied().unwrap_or("git").to_string();
            warn!(
                command = %command,
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "git command failed"
            );
            return Err(GitError::CommandFailed {
                command,
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Runner that records invocations and fails any command whose first
    /// argument matches `fail_on`.
    struct ScriptedRunner {
        calls: Mutex<Vec<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl ScriptedRunner {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on,
            }
        }
    }

    impl ProcessRunner for ScriptedRunner {
        async fn run(
            &self,
            _program: &str,
            args: &[String],
            _cwd: Option<&Path>,
        ) -> std::io::Result<CommandOutput> {
            self.calls.lock().unwrap().push(args.to_vec());
            let fail = self.fail_on.is_some_and(|f| args.first().map(String::as_str) == Some(f));
            Ok(CommandOutput {
                exit_code: if fail { 1 } else { 0 },
                stdout: String::new(),
                stderr: if fail { "boom".into() } else { String::new() },
            })
        }
    }

    #[tokio::test]
    async fn test_push_all_arguments() {
        let runner = ScriptedRunner::new(None);
        let git = GitCli::new(runner);
        git.push_all(Path::new("/tmp/wc"), "target").await.unwrap();
        let calls = git.runner.calls.lock().unwrap();
        assert_eq!(calls[0], vec!["push", "target", "--all"]);
    }

    #[tokio::test]
    async fn test_failed_command_is_typed() {
        let runner = ScriptedRunner::new(Some("push"));
        let git = GitCli::new(runner);
        let err = git.push_tags(Path::new("/tmp/wc"), "source").await.unwrap_err();
        match err {
            GitError::CommandFailed { command, exit_code, stderr } => {
                assert_eq!(command, "push");
                assert_eq!(exit_code, 1);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_remote_remove_swallows_failure() {
        let runner = ScriptedRunner::new(Some("remote"));
        let git = GitCli::new(runner);
        // Must not panic or propagate the error.
        git.remote_remove(Path::new("/tmp/wc"), "source").await;
        assert_eq!(git.runner.calls.lock().unwrap().len(), 1);
    }
}
