use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use contracts::domain::a002_sync_job::aggregate::SyncJob;
use std::sync::Arc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::{logger::JobLogger, registry::JobHandlerRegistry};
use crate::domain::a002_sync_job::repository;
use crate::shared::config::WorkerConfig;

/// Фоновый воркер очереди заданий синхронизации.
pub struct SyncJobWorker {
    registry: Arc<JobHandlerRegistry>,
    logger: Arc<JobLogger>,
    config: WorkerConfig,
}

impl SyncJobWorker {
    pub fn new(registry: Arc<JobHandlerRegistry>, logger: Arc<JobLogger>, config: WorkerConfig) -> Self {
        Self {
            registry,
            logger,
            config,
        }
    }

    /// Запускает цикл опроса очереди.
    pub async fn run_loop(&self) {
        info!(
            "Sync job worker started: every {}s, batch {}, handlers {:?}",
            self.config.poll_interval_seconds,
            self.config.batch_size,
            self.registry.job_types()
        );
        let mut interval = time::interval(time::Duration::from_secs(self.config.poll_interval_seconds.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if let Err(e) = self.tick().await {
                error!("Error processing sync jobs: {:?}", e);
            }
        }
    }

    /// One pass over the queue. Returns the number of jobs started.
    pub async fn tick(&self) -> Result<usize> {
        let now = Utc::now();

        let stale = repository::requeue_stale_processing(
            now - Duration::seconds(self.config.processing_timeout_seconds),
        )
        .await?;
        if stale.requeued > 0 {
            warn!("Requeued {} job(s) stuck in processing", stale.requeued);
        }
        if stale.failed > 0 {
            warn!("Failed {} job(s) lost on their final attempt", stale.failed);
        }

        let (failed_before, retry_at) = retry_window(&self.config, now);
        let retried = repository::requeue_failed(failed_before, retry_at).await?;
        if retried > 0 {
            info!("Requeued {} failed job(s) for retry", retried);
        }

        let jobs = repository::get_pending_jobs(self.config.batch_size).await?;
        let mut started = 0;
        for job in jobs {
            if !repository::mark_processing(job.id).await? {
                debug!("Job {} was taken by someone else", job.id);
                continue;
            }
            started += 1;
            let registry = Arc::clone(&self.registry);
            let logger = Arc::clone(&self.logger);
            tokio::spawn(async move {
                execute(registry, logger, job).await;
            });
        }

        let removed = repository::delete_old_completed(self.config.completed_retention_hours).await?;
        if removed > 0 {
            info!("Deleted {} completed job(s)", removed);
        }
        Ok(started)
    }
}

/// Failures older than `retry_delay` are due again right away:
/// `(failed_before, scheduled_at)`.
pub fn retry_window(config: &WorkerConfig, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now - Duration::seconds(config.retry_delay_seconds), now)
}

/// Runs one job that is already marked processing and records the outcome.
pub async fn execute(registry: Arc<JobHandlerRegistry>, logger: Arc<JobLogger>, job: SyncJob) {
    let attempt = job.attempts + 1;
    let outcome = match registry.get(job.job_type) {
        Some(handler) => {
            logger.log(
                job.id,
                &format!("Starting {} (attempt {}/{})", job.job_type, attempt, job.max_attempts),
            );
            handler.run(&job, &logger).await
        }
        None => Err(anyhow::anyhow!("No handler registered for job type {}", job.job_type)),
    };

    let stored = match outcome {
        Ok(()) => {
            logger.log(job.id, "Completed");
            repository::mark_completed(job.id).await
        }
        Err(e) => {
            let message = format!("{:#}", e);
            logger.log(job.id, &format!("Failed: {}", message));
            if attempt >= job.max_attempts {
                warn!("Job {} ({}) failed permanently: {}", job.id, job.job_type, message);
            }
            repository::mark_failed(job.id, &message).await
        }
    };
    if let Err(e) = stored {
        error!("Cannot store outcome of job {}: {}", job.id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_window() {
        let config = WorkerConfig {
            retry_delay_seconds: 60,
            ..WorkerConfig::default()
        };
        let now = Utc::now();
        let (failed_before, retry_at) = retry_window(&config, now);
        assert_eq!(now - failed_before, Duration::seconds(60));
        assert_eq!(retry_at, now);
    }
}
