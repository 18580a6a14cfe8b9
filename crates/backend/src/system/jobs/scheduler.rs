use anyhow::Result;
use contracts::domain::a002_sync_job::aggregate::{SyncJobType, TokenRefreshPayload};
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

use crate::domain::a001_connection::service as connection_service;
use crate::domain::a002_sync_job::{repository as job_repository, service as job_service};

/// Планировщик обновления токенов: ставит `token_refresh` для подключений,
/// чей токен скоро истечёт.
pub struct TokenRefreshScheduler {
    interval_seconds: u64,
    window_minutes: i64,
}

impl TokenRefreshScheduler {
    pub fn new(interval_seconds: u64, window_minutes: i64) -> Self {
        Self {
            interval_seconds,
            window_minutes,
        }
    }

    pub async fn run_loop(&self) {
        info!(
            "Token refresh scheduler started: every {}s, window {} min",
            self.interval_seconds, self.window_minutes
        );
        let mut interval = time::interval(time::Duration::from_secs(self.interval_seconds.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if let Err(e) = self.tick().await {
                error!("Token refresh scheduling failed: {:?}", e);
            }
        }
    }

    /// Returns the number of jobs queued.
    pub async fn tick(&self) -> Result<usize> {
        let mut queued = 0;
        for connection in connection_service::list_needing_refresh(self.window_minutes).await? {
            if job_repository::has_pending(connection.id, SyncJobType::TokenRefresh).await? {
                continue;
            }
            job_service::enqueue(connection.id, SyncJobType::TokenRefresh, &TokenRefreshPayload {}).await?;
            queued += 1;
        }
        if queued > 0 {
            info!("Queued token refresh for {} connection(s)", queued);
        }
        Ok(queued)
    }
}
