use std::future::Future;
use std::io;
use tracing::{error, info};

/// Resolves once `signal` reports a shutdown request. When the handler
/// cannot be installed the error is logged and this never resolves, so the
/// process keeps running.
pub async fn wait_for<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
