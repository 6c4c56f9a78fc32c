//! Bidirectional Gitea <-> GitHub repository sync engine.
//!
//! The [`SyncEngine`] orchestrates each repository pair through a small state
//! machine:
//!
//! 1. Resolve the pair against both host APIs (concurrently).
//! 2. Materialize the local working clone (clone once, fetch thereafter).
//! 3. Re-attach the `source`/`target` remotes with fresh credentials.
//! 4. Push branches and tags source→target (direction permitting).
//! 5. Fetch from target, push branches and tags back to source.
//! 6. Log the advisory issue-sync flag (unimplemented).
//!
//! Pairs are processed strictly sequentially; one pair's failure never aborts
//! its siblings. Push rejections on individual refs (protected branches,
//! permissions) are warnings, not failures. In dry-run mode the engine stops
//! after resolution and records the intended operations without touching disk.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{RepoPair, SyncConfig, SyncDirection};
use crate::git::remote_url::{authenticated_url, clone_dir_name, redact};
use crate::git::GitCli;
use crate::hosts::{HostSide, RepoResolver};
use crate::process::ProcessRunner;

/// Public base URL of the target host.
const GITHUB_BASE_URL: &str = "https://github.com";

/// Process-wide stop signal, checked between pairs and between cycles only.
/// An in-flight pair always runs to completion.
pub type StopFlag = Arc<AtomicBool>;

/// Create a stop flag that is never set (one-shot runs).
pub fn never_stop() -> StopFlag {
    Arc::new(AtomicBool::new(false))
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal status of one pair's sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStatus {
    Success,
    ResolutionFailed,
    CloneFailed,
    RemoteSetupFailed,
    FetchFailed,
}

impl std::fmt::Display for PairStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::ResolutionFailed => write!(f, "resolution_failed"),
            Self::CloneFailed => write!(f, "clone_failed"),
            Self::RemoteSetupFailed => write!(f, "remote_setup_failed"),
            Self::FetchFailed => write!(f, "fetch_failed"),
        }
    }
}

/// Result of syncing one pair.
#[derive(Debug)]
pub struct PairOutcome {
    pub source_repo: String,
    pub target_repo: String,
    pub status: PairStatus,
    /// Detail for a non-success status, with enough context to retry the pair.
    pub error: Option<String>,
    /// Tolerated push rejections.
    pub warnings: Vec<String>,
    /// Dry-run intent lines, in the order the operations would execute.
    pub planned: Vec<String>,
}

impl PairOutcome {
    fn new(pair: &RepoPair) -> Self {
        Self {
            source_repo: pair.source_repo.clone(),
            target_repo: pair.target_repo.clone(),
            status: PairStatus::Success,
            error: None,
            warnings: Vec::new(),
            planned: Vec::new(),
        }
    }

    fn fail(mut self, status: PairStatus, detail: String) -> Self {
        self.status = status;
        self.error = Some(detail);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == PairStatus::Success
    }
}

/// Aggregate result of one full cycle over the configured pairs.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<PairOutcome>,
    /// True if the stop flag cut the cycle short between pairs.
    pub interrupted: bool,
}

impl RunReport {
    /// Overall success: every attempted pair reached `Success`.
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(PairOutcome::is_success)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The repository sync engine.
///
/// Generic over the [`ProcessRunner`] executing git and the [`RepoResolver`]
/// answering host API lookups, so the whole state machine is testable without
/// a network or a git binary.
pub struct SyncEngine<R, V> {
    config: SyncConfig,
    git: GitCli<R>,
    resolver: V,
    workspace_root: PathBuf,
    dry_run: bool,
}

impl<R: ProcessRunner, V: RepoResolver> SyncEngine<R, V> {
    /// Create an engine. `force_dry_run` overrides the configured setting
    /// (CLI `--dry-run` / `DRY_RUN` env).
    pub fn new(
        config: SyncConfig,
        runner: R,
        resolver: V,
        workspace_root: impl Into<PathBuf>,
        force_dry_run: bool,
    ) -> Self {
        let dry_run = force_dry_run || config.sync_settings.dry_run;
        let workspace_root = workspace_root.into();
        info!(
            workspace = %workspace_root.display(),
            dry_run,
            pairs = config.repository_pairs.len(),
            "initializing sync engine"
        );
        Self {
            config,
            git: GitCli::new(runner),
            resolver,
            workspace_root,
            dry_run,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Deterministic working-clone path for a pair, derived from the source
    /// repository identifier. One exclusive directory per pair.
    pub fn clone_path(&self, pair: &RepoPair) -> PathBuf {
        self.workspace_root.join(clone_dir_name(&pair.source_repo))
    }

    // -----------------------------------------------------------------------
    // Full cycle
    // -----------------------------------------------------------------------

    /// Sync every configured pair in order, collecting all outcomes.
    ///
    /// A failing pair is reported and skipped; the remaining pairs are still
    /// attempted. The stop flag is consulted only between pairs.
    pub async fn sync_all(&self, stop: &StopFlag) -> RunReport {
        let mut report = RunReport::default();

        for pair in &self.config.repository_pairs {
            if stop.load(Ordering::SeqCst) {
                info!("stop requested, leaving remaining pairs for the next run");
                report.interrupted = true;
                break;
            }

            let outcome = self.sync_pair(pair).await;
            match outcome.status {
                PairStatus::Success => info!(
                    source = %outcome.source_repo,
                    target = %outcome.target_repo,
                    warnings = outcome.warnings.len(),
                    "pair synced"
                ),
                status => warn!(
                    source = %outcome.source_repo,
                    target = %outcome.target_repo,
                    status = %status,
                    error = outcome.error.as_deref().unwrap_or(""),
                    "pair failed"
                ),
            }
            report.outcomes.push(outcome);
        }

        info!(
            pairs = report.outcomes.len(),
            ok = report.outcomes.iter().filter(|o| o.is_success()).count(),
            "sync cycle completed"
        );
        report
    }

    // -----------------------------------------------------------------------
    // Per-pair state machine
    // -----------------------------------------------------------------------

    /// Sync one pair, terminal on the first hard failure.
    pub async fn sync_pair(&self, pair: &RepoPair) -> PairOutcome {
        info!(
            source = %pair.source_repo,
            target = %pair.target_repo,
            direction = %pair.sync_direction,
            "syncing repository pair"
        );
        let outcome = PairOutcome::new(pair);

        // 1. Resolve against both hosts. The calls run concurrently but both
        //    results are collected before any git operation starts.
        let (source_info, target_info) = tokio::join!(
            self.resolver.resolve(HostSide::Source, &pair.source_repo),
            self.resolver.resolve(HostSide::Target, &pair.target_repo),
        );

        let mut resolution_failures = Vec::new();
        if let Err(e) = &source_info {
            warn!(repo = %pair.source_repo, error = %e, "source resolution failed");
            resolution_failures.push(e.to_string());
        }
        if let Err(e) = &target_info {
            warn!(repo = %pair.target_repo, error = %e, "target resolution failed");
            resolution_failures.push(e.to_string());
        }
        if !resolution_failures.is_empty() {
            return outcome.fail(PairStatus::ResolutionFailed, resolution_failures.join("; "));
        }

        let source_url = authenticated_url(
            &self.config.source_host.url,
            &self.config.source_host.username,
            &self.config.source_host.token,
            &pair.source_repo,
        );
        let target_url = authenticated_url(
            GITHUB_BASE_URL,
            &self.config.target_host.username,
            &self.config.target_host.token,
            &pair.target_repo,
        );
        let path = self.clone_path(pair);

        if self.dry_run {
            return self.plan_pair(pair, outcome, &path, &source_url, &target_url);
        }

        // 2. Materialize the working clone: clone once, fetch thereafter.
        let materialized = if path.exists() {
            info!(path = %path.display(), "updating existing working clone");
            self.git.fetch_all(&path).await
        } else {
            info!(path = %path.display(), url = %redact(&source_url), "cloning working copy");
            if let Err(e) = std::fs::create_dir_all(&self.workspace_root) {
                return outcome.fail(PairStatus::CloneFailed, e.to_string());
            }
            self.git.clone_repo(&source_url, &path).await
        };
        if let Err(e) = materialized {
            return outcome.fail(PairStatus::CloneFailed, e.to_string());
        }

        // 3. Re-attach remotes with freshly constructed URLs so credential
        //    rotation takes effect on every run.
        self.git.remote_remove(&path, "source").await;
        self.git.remote_remove(&path, "target").await;
        if let Err(e) = self.git.remote_add(&path, "source", &source_url).await {
            return outcome.fail(PairStatus::RemoteSetupFailed, e.to_string());
        }
        if let Err(e) = self.git.remote_add(&path, "target", &target_url).await {
            return outcome.fail(PairStatus::RemoteSetupFailed, e.to_string());
        }

        let mut outcome = outcome;

        // 4. Push source -> target. Always precedes step 5: publish the local
        //    view of the source outward before reconciling inbound changes.
        if matches!(
            pair.sync_direction,
            SyncDirection::Bidirectional | SyncDirection::SourceToTarget
        ) {
            info!(source = %pair.source_repo, "pushing branches and tags from source to target");
            self.push_refs(&path, "target", &mut outcome).await;
        }

        // 5. Fetch target -> push source. The fetch is a hard failure, the
        //    pushes tolerate rejections like step 4.
        if matches!(
            pair.sync_direction,
            SyncDirection::Bidirectional | SyncDirection::TargetToSource
        ) {
            info!(target = %pair.target_repo, "fetching from target to reconcile back to source");
            if let Err(e) = self.git.fetch_remote(&path, "target").await {
                return outcome.fail(PairStatus::FetchFailed, e.to_string());
            }
            self.push_refs(&path, "source", &mut outcome).await;
        }

        // 6. Issue sync is advisory only.
        if pair.sync_issues {
            info!(
                source = %pair.source_repo,
                "issue synchronization is not implemented; skipping"
            );
        }

        outcome
    }

    /// Push all branches, then all tags, to `remote`. Rejections of individual
    /// refs (protected branches, permission denials) are an expected steady
    /// state and are downgraded to warnings.
    async fn push_refs(&self, path: &std::path::Path, remote: &str, outcome: &mut PairOutcome) {
        if let Err(e) = self.git.push_all(path, remote).await {
            warn!(remote, error = %e, "branch push partially rejected");
            outcome.warnings.push(format!("push --all {}: {}", remote, e));
        }
        if let Err(e) = self.git.push_tags(path, remote).await {
            warn!(remote, error = %e, "tag push partially rejected");
            outcome.warnings.push(format!("push --tags {}: {}", remote, e));
        }
    }

    /// Record and log the operations a real run would perform, in order,
    /// without touching the workspace.
    fn plan_pair(
        &self,
        pair: &RepoPair,
        mut outcome: PairOutcome,
        path: &std::path::Path,
        source_url: &str,
        target_url: &str,
    ) -> PairOutcome {
        let mut plan = |line: String| {
            info!("dry-run: {}", line);
            outcome.planned.push(line);
        };

        if path.exists() {
            plan(format!("would fetch all remotes in {}", path.display()));
        } else {
            plan(format!(
                "would clone {} into {}",
                redact(source_url),
                path.display()
            ));
        }
        plan(format!(
            "would reset remotes: source -> {}, target -> {}",
            redact(source_url),
            redact(target_url)
        ));

        if matches!(
            pair.sync_direction,
            SyncDirection::Bidirectional | SyncDirection::SourceToTarget
        ) {
            plan("would push all branches and tags from source to target".to_string());
        }
        if matches!(
            pair.sync_direction,
            SyncDirection::Bidirectional | SyncDirection::TargetToSource
        ) {
            plan("would fetch from target, then push all branches and tags to source".to_string());
        }
        if pair.sync_issues {
            info!(
                source = %pair.source_repo,
                "issue synchronization is not implemented; skipping"
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_status_display() {
        assert_eq!(PairStatus::Success.to_string(), "success");
        assert_eq!(PairStatus::ResolutionFailed.to_string(), "resolution_failed");
        assert_eq!(PairStatus::CloneFailed.to_string(), "clone_failed");
        assert_eq!(PairStatus::RemoteSetupFailed.to_string(), "remote_setup_failed");
        assert_eq!(PairStatus::FetchFailed.to_string(), "fetch_failed");
    }

    #[test]
    fn test_run_report_success_aggregation() {
        let mut report = RunReport::default();
        assert!(report.succeeded());

        let pair = RepoPair::from_spec("org/app");
        report.outcomes.push(PairOutcome::new(&pair));
        assert!(report.succeeded());

        report
            .outcomes
            .push(PairOutcome::new(&pair).fail(PairStatus::FetchFailed, "x".into()));
        assert!(!report.succeeded());
    }
}
