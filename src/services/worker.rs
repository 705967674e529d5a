use crate::services::file_service::FileService;
use crate::services::session_service::SessionService;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

/// Periodic housekeeping: the expired-token sweep plus release of idle
/// per-user file locks. Runs until shutdown is signalled.
pub struct BackgroundWorker {
    sessions: SessionService,
    file_service: Arc<FileService>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl BackgroundWorker {
    pub fn new(
        sessions: SessionService,
        file_service: Arc<FileService>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            sessions,
            file_service,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            "🚀 Background worker started (sweep every {:?})",
            self.interval
        );

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Background worker shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.perform_cleanup().await;
                }
            }
        }
    }

    /// One sweep; returns the number of expired tokens removed.
    /// Errors are logged and never end the loop.
    pub async fn perform_cleanup(&self) -> u64 {
        tracing::debug!("🧹 Running expired token sweep...");

        let removed = match self.sessions.cleanup_expired_tokens().await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!("Token sweep failed: {}", e);
                0
            }
        };

        let released = self.file_service.release_idle_locks();
        if released > 0 {
            tracing::debug!("🔓 Released {} idle user locks", released);
        }

        removed
    }
}
