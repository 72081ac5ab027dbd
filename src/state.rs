use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::sessions::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    sessions: Arc<SessionRegistry>,
    config: Arc<Config>,
    sse_connections: Arc<AtomicUsize>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: &Config, shutdown_tx: broadcast::Sender<()>) -> Self {
        let sessions = Arc::new(SessionRegistry::new(
            config.detector,
            config.limits.max_sessions,
            config.limits.event_channel_capacity,
        ));

        Self {
            sessions,
            config: Arc::new(config.clone()),
            sse_connections: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared SSE connection counter; scoped per state so parallel test apps
    /// do not see each other's streams.
    pub fn sse_connections(&self) -> &Arc<AtomicUsize> {
        &self.sse_connections
    }

    pub fn active_sse_connections(&self) -> usize {
        self.sse_connections.load(Ordering::SeqCst)
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
