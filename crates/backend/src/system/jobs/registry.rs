use contracts::domain::a002_sync_job::aggregate::SyncJobType;
use std::collections::HashMap;
use std::sync::Arc;

use super::handler::JobHandler;

/// Реестр исполнителей заданий по типу задания.
pub struct JobHandlerRegistry {
    handlers: HashMap<SyncJobType, Arc<dyn JobHandler>>,
}

impl JobHandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Регистрирует исполнителя; повторная регистрация типа заменяет прежнего.
    pub fn register<T: JobHandler + 'static>(&mut self, handler: T) {
        self.handlers.insert(handler.job_type(), Arc::new(handler));
    }

    pub fn get(&self, job_type: SyncJobType) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(&job_type).cloned()
    }

    pub fn job_types(&self) -> Vec<SyncJobType> {
        SyncJobType::all()
            .into_iter()
            .filter(|t| self.handlers.contains_key(t))
            .collect()
    }
}

impl Default for JobHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
