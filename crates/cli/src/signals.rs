//! Graceful shutdown signal handling for continuous mode.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use forgesync_core::engine::StopFlag;

/// Create a stop flag and register OS signal handlers.
///
/// On SIGTERM or SIGINT (Ctrl+C), the flag is set to `true`. The sync loop
/// checks it between cycles and between pairs; an in-flight pair finishes.
pub fn setup_signal_handlers() -> StopFlag {
    let flag: StopFlag = Arc::new(AtomicBool::new(false));
    let flag_clone = flag.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), stopping after the current pair");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, stopping after the current pair");
                }
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.expect("failed to listen for Ctrl+C");
            info!("received Ctrl+C, stopping after the current pair");
        }

        flag_clone.store(true, Ordering::SeqCst);
    });

    flag
}
