use std::time::Duration;

use tokio::sync::watch;

use crate::db;
use crate::state::SharedState;

const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Periodic cleanup of expired refresh tokens and stale login-limiter entries.
/// Runs until `shutdown` flips to true.
pub async fn run_housekeeping(state: SharedState, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(HOUSEKEEPING_INTERVAL);
    tracing::debug!("Housekeeping started");

    loop {
        tokio::select! {
            _ = ticker.tick() => sweep(&state).await,
            _ = shutdown.changed() => {}
        }
        if *shutdown.borrow() {
            break;
        }
    }

    tracing::debug!("Housekeeping stopped");
}

async fn sweep(state: &SharedState) {
    state.login_limiter.cleanup();
    match db::refresh_tokens::delete_expired(&state.pool).await {
        Ok(0) => {}
        Ok(n) => tracing::info!("Removed {n} expired refresh tokens"),
        Err(e) => tracing::error!("Failed to remove expired refresh tokens: {e}"),
    }
}
