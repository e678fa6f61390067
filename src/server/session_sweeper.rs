use crate::application_port::AuthError;
use crate::domain_port::SessionStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Periodically drops sessions whose refresh lifetime has run out.
pub struct SessionSweeper {
    session_store: Arc<dyn SessionStore>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl SessionSweeper {
    pub fn new(
        session_store: Arc<dyn SessionStore>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            session_store,
            interval,
            cancellation_token,
        }
    }

    pub async fn tick_once(&self) -> Result<u64, AuthError> {
        let removed = self.session_store.sweep_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::info!(removed, "expired sessions swept");
        }
        Ok(removed)
    }

    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("SessionSweeper shutting down...");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.tick_once().await {
                        tracing::error!("SessionSweeper error: {}", e);
                    }
                }
            }
        }
    }
}
