//! REST API clients for the two git hosts.
//!
//! Both Gitea and GitHub expose a repository-info endpoint used to verify a
//! pair is reachable before any git operation is attempted. The engine talks
//! to the hosts through the [`RepoResolver`] trait so tests can substitute a
//! canned resolver.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::errors::ResolutionError;

/// Finite timeout for every host API request; nothing blocks indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which side of a pair a resolution call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostSide {
    Source,
    Target,
}

impl std::fmt::Display for HostSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// Repository metadata returned by a host's repository-info endpoint.
///
/// Only the fields the engine cares about; both hosts return far more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMetadata {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub private: Option<bool>,
}

/// Resolve a repository identifier against one of the configured hosts.
pub trait RepoResolver: Send + Sync {
    fn resolve(
        &self,
        side: HostSide,
        repo: &str,
    ) -> impl Future<Output = Result<RepoMetadata, ResolutionError>> + Send;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Asynchronous REST client for one git host.
#[derive(Debug, Clone)]
pub struct HostClient {
    http: reqwest::Client,
    host_name: String,
    api_base: String,
    token: String,
}

impl HostClient {
    /// Client for a Gitea instance rooted at `base_url`.
    pub fn gitea(base_url: &str, token: impl Into<String>) -> Self {
        let api_base = format!("{}/api/v1", base_url.trim_end_matches('/'));
        Self::build("gitea", api_base, token.into(), None)
    }

    /// Client for the GitHub REST API.
    pub fn github(token: impl Into<String>) -> Self {
        Self::build(
            "github",
            "https://api.github.com".to_string(),
            token.into(),
            Some(HeaderValue::from_static("application/vnd.github+json")),
        )
    }

    fn build(host_name: &str, api_base: String, token: String, accept: Option<HeaderValue>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("forgesync/0.1"));
        if let Some(accept) = accept {
            headers.insert(ACCEPT, accept);
        }
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");
        info!(host = host_name, api_base = %api_base, "created host client");
        Self {
            http,
            host_name: host_name.to_string(),
            api_base,
            token,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Fetch repository info for `owner/name`.
    ///
    /// Any 2xx response whose JSON body does not carry a `message` field is
    /// a success; everything else is a [`ResolutionError`] local to the pair.
    pub async fn repo_info(&self, repo: &str) -> Result<RepoMetadata, ResolutionError> {
        let url = format!("{}/repos/{}", self.api_base, repo);
        let resp = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .send()
            .await
            .map_err(|e| ResolutionError::Network {
                host: self.host_name.clone(),
                repo: repo.to_string(),
                detail: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ResolutionError::Status {
                host: self.host_name.clone(),
                repo: repo.to_string(),
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value =
            resp.json().await.map_err(|e| ResolutionError::Parse {
                host: self.host_name.clone(),
                repo: repo.to_string(),
                detail: e.to_string(),
            })?;

        if let Some(message) = body.get("message").and_then(|m| m.as_str()) {
            return Err(ResolutionError::Api {
                host: self.host_name.clone(),
                repo: repo.to_string(),
                message: message.to_string(),
            });
        }

        let metadata: RepoMetadata =
            serde_json::from_value(body).map_err(|e| ResolutionError::Parse {
                host: self.host_name.clone(),
                repo: repo.to_string(),
                detail: e.to_string(),
            })?;

        debug!(host = %self.host_name, repo, full_name = %metadata.full_name, "resolved repository");
        Ok(metadata)
    }
}

// ---------------------------------------------------------------------------
// Production resolver
// ---------------------------------------------------------------------------

/// Resolver backed by live HTTP clients for both configured hosts.
#[derive(Debug, Clone)]
pub struct HttpResolver {
    source: HostClient,
    target: HostClient,
}

impl HttpResolver {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            source: HostClient::gitea(&config.source_host.url, config.source_host.token.as_str()),
            target: HostClient::github(config.target_host.token.as_str()),
        }
    }
}

impl RepoResolver for HttpResolver {
    async fn resolve(&self, side: HostSide, repo: &str) -> Result<RepoMetadata, ResolutionError> {
        match side {
            HostSide::Source => self.source.repo_info(repo).await,
            HostSide::Target => self.target.repo_info(repo).await,
        }
    }
}
