//! JSON-based configuration system for forgesync.
//!
//! The configuration describes the two git hosts (a self-hosted Gitea
//! instance and GitHub), the repository pairs to mirror, and the sync
//! behaviour. Parsing goes through strongly-typed structs so malformed input
//! is rejected at load time instead of deep inside sync logic.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a JSON file, immutable during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// The source host: a self-hosted Gitea instance.
    pub source_host: SourceHostConfig,

    /// The target host: GitHub.
    pub target_host: TargetHostConfig,

    /// Repository pairs to synchronize, processed in order.
    #[serde(default)]
    pub repository_pairs: Vec<RepoPair>,

    /// Sync behaviour settings.
    #[serde(default)]
    pub sync_settings: SyncSettings,
}

/// Connection settings for the Gitea source host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHostConfig {
    /// Base URL of the Gitea instance (e.g. `https://git.example.com`).
    #[serde(default)]
    pub url: String,

    /// Username on the source host.
    #[serde(default)]
    pub username: String,

    /// API access token for the source host.
    #[serde(default)]
    pub token: String,
}

/// Connection settings for the GitHub target host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetHostConfig {
    /// GitHub username.
    #[serde(default)]
    pub username: String,

    /// GitHub personal access token.
    #[serde(default)]
    pub token: String,
}

// ---------------------------------------------------------------------------
// Repository pairs
// ---------------------------------------------------------------------------

/// Direction of synchronization for a pair.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// Push source→target, then reconcile target→source.
    #[default]
    Bidirectional,
    /// Only push from the source host to the target host.
    SourceToTarget,
    /// Only fetch from the target host and push back to the source host.
    TargetToSource,
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bidirectional => write!(f, "bidirectional"),
            Self::SourceToTarget => write!(f, "source_to_target"),
            Self::TargetToSource => write!(f, "target_to_source"),
        }
    }
}

/// A configured mapping between one repository on each host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoPair {
    /// `owner/name` identifier on the source host.
    pub source_repo: String,

    /// `owner/name` identifier on the target host (may differ).
    pub target_repo: String,

    /// Which way refs flow.
    #[serde(default)]
    pub sync_direction: SyncDirection,

    /// Advisory flag; issue synchronization is unimplemented and only logged.
    #[serde(default)]
    pub sync_issues: bool,
}

impl RepoPair {
    /// Build an ad-hoc pair from a CLI spec: `owner/name` mirrors to the same
    /// identifier on both hosts, `a/b:c/d` maps source `a/b` to target `c/d`.
    pub fn from_spec(spec: &str) -> Self {
        let (source, target) = match spec.split_once(':') {
            Some((s, t)) => (s, t),
            None => (spec, spec),
        };
        Self {
            source_repo: source.to_string(),
            target_repo: target.to_string(),
            sync_direction: SyncDirection::default(),
            sync_issues: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Sync settings
// ---------------------------------------------------------------------------

/// Conflict handling policy. Only manual resolution is supported: diverged
/// refs are surfaced as push warnings for a human to reconcile.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    #[default]
    Manual,
}

/// Sync behaviour configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Log intended git operations without executing them.
    #[serde(default)]
    pub dry_run: bool,

    /// Seconds between continuous-mode cycles (measured from cycle end).
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,

    /// Conflict handling policy.
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,
}

fn default_sync_interval() -> u64 {
    300
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            sync_interval_seconds: default_sync_interval(),
            conflict_resolution: ConflictResolution::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl SyncConfig {
    /// Load and validate a [`SyncConfig`] from a JSON file.
    ///
    /// If the file does not exist, a template is written to the path and
    /// [`ConfigError::Missing`] is returned; the caller is expected to edit
    /// the template and re-run.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            Self::write_template(path)?;
            return Err(ConfigError::Missing(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: SyncConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        debug!(
            pairs = config.repository_pairs.len(),
            "configuration parsed successfully"
        );
        Ok(config)
    }

    /// Validate that all required fields are present and sane.
    ///
    /// Repository pairs are only checked for shape here; whether they exist
    /// on the hosts is deferred to per-pair resolution.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn required(field: &str, value: &str) -> Result<(), ConfigError> {
            if value.is_empty() {
                return Err(ConfigError::InvalidSchema {
                    field: field.into(),
                    detail: "must not be empty".into(),
                });
            }
            Ok(())
        }

        required("source_host.url", &self.source_host.url)?;
        required("source_host.username", &self.source_host.username)?;
        required("source_host.token", &self.source_host.token)?;
        required("target_host.username", &self.target_host.username)?;
        required("target_host.token", &self.target_host.token)?;

        if self.sync_settings.sync_interval_seconds == 0 {
            return Err(ConfigError::InvalidSchema {
                field: "sync_settings.sync_interval_seconds".into(),
                detail: "sync interval must be >= 1".into(),
            });
        }

        for (i, pair) in self.repository_pairs.iter().enumerate() {
            for (name, repo) in [("source_repo", &pair.source_repo), ("target_repo", &pair.target_repo)] {
                if !repo.contains('/') || repo.starts_with('/') || repo.ends_with('/') {
                    return Err(ConfigError::InvalidSchema {
                        field: format!("repository_pairs[{}].{}", i, name),
                        detail: format!("'{}' is not in 'owner/name' format", repo),
                    });
                }
            }
        }

        Ok(())
    }

    /// Write a template configuration with placeholder credentials and one
    /// sample pair. The template parses back into a valid [`SyncConfig`].
    pub fn write_template<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let template = Self::template();
        let json = serde_json::to_string_pretty(&template)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, json + "\n")?;
        info!(path = %path.display(), "wrote configuration template");
        Ok(())
    }

    /// The template configuration written by [`write_template`](Self::write_template).
    pub fn template() -> Self {
        Self {
            source_host: SourceHostConfig {
                url: "https://your-gitea-instance.com".into(),
                username: "your-gitea-username".into(),
                token: "your-gitea-api-token".into(),
            },
            target_host: TargetHostConfig {
                username: "your-github-username".into(),
                token: "your-github-personal-access-token".into(),
            },
            repository_pairs: vec![RepoPair {
                source_repo: "owner/repo-name".into(),
                target_repo: "owner/repo-name".into(),
                sync_direction: SyncDirection::Bidirectional,
                sync_issues: false,
            }],
            sync_settings: SyncSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "source_host": {
                "url": "https://git.example.com",
                "username": "alice",
                "token": "gitea-token"
            },
            "target_host": {
                "username": "alice-gh",
                "token": "ghp_token"
            },
            "repository_pairs": [
                {
                    "source_repo": "acme/widgets",
                    "target_repo": "acme-mirror/widgets",
                    "sync_direction": "source_to_target",
                    "sync_issues": true
                },
                {
                    "source_repo": "acme/gadgets",
                    "target_repo": "acme/gadgets"
                }
            ],
            "sync_settings": {
                "dry_run": true,
                "sync_interval_seconds": 60
            }
        }"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: SyncConfig = serde_json::from_str(sample_json()).expect("failed to parse");
        assert_eq!(config.source_host.url, "https://git.example.com");
        assert_eq!(config.repository_pairs.len(), 2);
        assert_eq!(
            config.repository_pairs[0].sync_direction,
            SyncDirection::SourceToTarget
        );
        assert!(config.repository_pairs[0].sync_issues);
        assert!(config.sync_settings.dry_run);
        assert_eq!(config.sync_settings.sync_interval_seconds, 60);
    }

    #[test]
    fn test_pair_defaults_applied() {
        let config: SyncConfig = serde_json::from_str(sample_json()).unwrap();
        let pair = &config.repository_pairs[1];
        assert_eq!(pair.sync_direction, SyncDirection::Bidirectional);
        assert!(!pair.sync_issues);
    }

    #[test]
    fn test_settings_defaults_applied() {
        let minimal = r#"{
            "source_host": {"url": "https://g", "username": "u", "token": "t"},
            "target_host": {"username": "u", "token": "t"}
        }"#;
        let config: SyncConfig = serde_json::from_str(minimal).unwrap();
        assert!(!config.sync_settings.dry_run);
        assert_eq!(config.sync_settings.sync_interval_seconds, 300);
        assert_eq!(
            config.sync_settings.conflict_resolution,
            ConflictResolution::Manual
        );
        assert!(config.repository_pairs.is_empty());
    }

    #[test]
    fn test_load_writes_template_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync_config.json");

        let result = SyncConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::Missing(_))));
        assert!(path.exists());

        // The template must parse back with a non-empty sample pair.
        let template: SyncConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(!template.repository_pairs.is_empty());
        template.validate().unwrap();
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, sample_json()).unwrap();

        let config = SyncConfig::load(&path).expect("load failed");
        assert_eq!(config.target_host.username, "alice-gh");
    }

    #[test]
    fn test_validate_rejects_missing_token() {
        let mut config: SyncConfig = serde_json::from_str(sample_json()).unwrap();
        config.source_host.token = String::new();
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSchema { ref field, .. }) if field == "source_host.token"
        ));
    }

    #[test]
    fn test_validate_rejects_missing_target_username() {
        let json = r#"{
            "source_host": {"url": "https://g", "username": "u", "token": "t"},
            "target_host": {"token": "t"}
        }"#;
        let config: SyncConfig = serde_json::from_str(json).unwrap();
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSchema { ref field, .. }) if field == "target_host.username"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_repo_format() {
        let mut config: SyncConfig = serde_json::from_str(sample_json()).unwrap();
        config.repository_pairs[0].source_repo = "noslash".into();
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSchema { ref field, .. })
                if field == "repository_pairs[0].source_repo"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config: SyncConfig = serde_json::from_str(sample_json()).unwrap();
        config.sync_settings.sync_interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error_on_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let result = SyncConfig::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_pair_from_spec_single() {
        let pair = RepoPair::from_spec("org/app");
        assert_eq!(pair.source_repo, "org/app");
        assert_eq!(pair.target_repo, "org/app");
        assert_eq!(pair.sync_direction, SyncDirection::Bidirectional);
        assert!(!pair.sync_issues);
    }

    #[test]
    fn test_pair_from_spec_mapped() {
        let pair = RepoPair::from_spec("org/a:org/b");
        assert_eq!(pair.source_repo, "org/a");
        assert_eq!(pair.target_repo, "org/b");
        assert_eq!(pair.sync_direction, SyncDirection::Bidirectional);
    }
}
