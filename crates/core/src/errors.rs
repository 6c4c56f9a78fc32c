//! Error types for the forgesync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`.
//! Configuration errors are fatal to a run; resolution and git errors are
//! local to the repository pair that produced them.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found. A template has been written to the path so the
    /// caller can edit it and re-run.
    #[error("configuration file not found: {0} (a template was written there)")]
    Missing(String),

    /// JSON parse error.
    #[error("configuration parse error: {0}")]
    Parse(String),

    /// A required field is missing or has an invalid value.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidSchema { field: String, detail: String },

    /// Generic I/O error reading or writing the config file.
    #[error("configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Repository resolution errors
// ---------------------------------------------------------------------------

/// Errors from resolving a repository against a host's REST API.
///
/// These are always local to one pair: the pair is reported and skipped,
/// sibling pairs still run.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// HTTP-level transport error (network, TLS, timeout).
    #[error("{host}: network error resolving '{repo}': {detail}")]
    Network {
        host: String,
        repo: String,
        detail: String,
    },

    /// The API returned a non-success status code.
    #[error("{host}: HTTP {status} resolving '{repo}'")]
    Status {
        host: String,
        repo: String,
        status: u16,
    },

    /// A 2xx response whose JSON body carries an error `message` field.
    #[error("{host}: API error resolving '{repo}': {message}")]
    Api {
        host: String,
        repo: String,
        message: String,
    },

    /// The response body was not valid JSON.
    #[error("{host}: unparseable response resolving '{repo}': {detail}")]
    Parse {
        host: String,
        repo: String,
        detail: String,
    },
}

impl ResolutionError {
    /// The host that produced this error.
    pub fn host(&self) -> &str {
        match self {
            Self::Network { host, .. }
            | Self::Status { host, .. }
            | Self::Api { host, .. }
            | Self::Parse { host, .. } => host,
        }
    }
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from git subprocess invocations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary was not found on `$PATH`.
    #[error("git binary not found on PATH")]
    BinaryNotFound,

    /// A `git` command exited with a non-zero status.
    #[error("git {command} failed (exit {exit_code}): {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// Generic I/O wrapper (spawn failures other than a missing binary).
    #[error("git I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = ConfigError::InvalidSchema {
            field: "source_host.token".into(),
            detail: "must not be empty".into(),
        };
        assert!(err.to_string().contains("source_host.token"));

        let err = ResolutionError::Status {
            host: "gitea".into(),
            repo: "acme/widgets".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "gitea: HTTP 404 resolving 'acme/widgets'");
        assert_eq!(err.host(), "gitea");

        let err = GitError::CommandFailed {
            command: "push".into(),
            exit_code: 128,
            stderr: "remote rejected".into(),
        };
        assert!(err.to_string().contains("exit 128"));
    }
}
