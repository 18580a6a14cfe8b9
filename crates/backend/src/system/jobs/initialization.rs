use std::sync::Arc;

use super::{
    handlers::{
        InventorySyncHandler, OrderSyncHandler, ProductPushHandler, ProductUpdateHandler,
        TokenRefreshHandler,
    },
    logger::{init_job_logger, JobLogger},
    registry::JobHandlerRegistry,
    scheduler::TokenRefreshScheduler,
    worker::SyncJobWorker,
};
use crate::shared::config::WorkerConfig;
use crate::system::tracing::log_dir;

/// Собирает реестр исполнителей, воркер очереди и планировщик обновления токенов.
pub fn initialize_jobs(config: &WorkerConfig) -> (SyncJobWorker, TokenRefreshScheduler) {
    let mut registry = JobHandlerRegistry::new();
    registry.register(ProductPushHandler);
    registry.register(ProductUpdateHandler);
    registry.register(InventorySyncHandler);
    registry.register(OrderSyncHandler);
    registry.register(TokenRefreshHandler);

    let logger = Arc::new(JobLogger::new(log_dir()));
    init_job_logger(Arc::clone(&logger));

    let worker = SyncJobWorker::new(Arc::new(registry), logger, config.clone());
    let scheduler = TokenRefreshScheduler::new(
        config.token_refresh_interval_seconds,
        config.token_refresh_window_minutes,
    );
    (worker, scheduler)
}
