//! Run CPU-bound work off the async runtime, racing it against shutdown signals.

use anyhow::{Context, Result};
use contracts::SyncError;
use tracing::{debug, warn};

use crate::error::CliError;

/// Run `work` on the blocking pool.
///
/// Returns [`CliError::Interrupted`] as soon as Ctrl+C or SIGTERM arrives;
/// the caller is expected to exit, since the blocking task cannot be cancelled.
pub async fn run_blocking<T, F>(task: &'static str, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, SyncError> + Send + 'static,
{
    debug!(task, "starting");
    let handle = tokio::task::spawn_blocking(work);

    tokio::select! {
        joined = handle => {
            let result = joined.with_context(|| format!("{task} task panicked"))?;
            result.with_context(|| format!("{task} failed"))
        }
        _ = shutdown_signal() => {
            warn!(task, "received shutdown signal");
            Err(CliError::Interrupted { task }.into())
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
