use std::time::Duration;

use crate::sessions::SessionRegistry;

pub async fn run(registry: &SessionRegistry, max_idle: Duration) {
    tracing::debug!("session_reaper: start");
    let reaped = registry.reap_idle(max_idle).await;
    if reaped > 0 {
        let remaining = registry.len().await;
        tracing::info!(
            reaped,
            remaining,
            idle_secs = max_idle.as_secs(),
            "session_reaper: removed idle sessions"
        );
    } else {
        tracing::debug!("session_reaper: nothing to do");
    }
}
