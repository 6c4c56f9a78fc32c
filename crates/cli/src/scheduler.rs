//! Continuous-mode loop: repeat full sync cycles at a fixed interval.

use std::sync::atomic::Ordering;
use std::time::Duration;

use tracing::{info, warn};

use forgesync_core::engine::{StopFlag, SyncEngine};
use forgesync_core::hosts::RepoResolver;
use forgesync_core::process::ProcessRunner;

/// Run `sync_all` forever with `interval` of sleep measured from the end of
/// one cycle to the start of the next. Returns once the stop flag is set.
pub async fn run_continuous<R, V>(engine: &SyncEngine<R, V>, interval: Duration, stop: &StopFlag)
where
    R: ProcessRunner,
    V: RepoResolver,
{
    info!(
        interval_secs = interval.as_secs(),
        "starting continuous sync loop"
    );

    loop {
        if stop.load(Ordering::SeqCst) {
            info!("stop requested, exiting continuous loop");
            break;
        }

        let report = engine.sync_all(stop).await;
        let failed = report
            .outcomes
            .iter()
            .filter(|o| !o.is_success())
            .count();
        if failed > 0 {
            warn!(failed, total = report.outcomes.len(), "sync cycle completed with failures");
        }
        if report.interrupted {
            break;
        }

        // Sleep in one-second steps so shutdown is honored promptly.
        let step = Duration::from_secs(1);
        let mut slept = Duration::ZERO;
        while slept < interval {
            if stop.load(Ordering::SeqCst) {
                info!("stop requested during sleep, exiting continuous loop");
                return;
            }
            tokio::time::sleep(step).await;
            slept += step;
        }
    }
}
