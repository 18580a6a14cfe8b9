use anyhow::Result;
use chrono::Utc;
use contracts::domain::a002_sync_job::aggregate::SyncJobId;
use once_cell::sync::OnceCell;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

static JOB_LOGGER: OnceCell<Arc<JobLogger>> = OnceCell::new();

/// Логгер выполнения заданий синхронизации.
/// Каждое задание пишет в собственный файл `job_logs/{job_id}.log`.
pub struct JobLogger {
    log_dir: PathBuf,
}

impl JobLogger {
    pub fn new(base_log_dir: impl AsRef<Path>) -> Self {
        Self {
            log_dir: base_log_dir.as_ref().join("job_logs"),
        }
    }

    pub fn log_file_path(&self, job_id: SyncJobId) -> PathBuf {
        self.log_dir.join(format!("{}.log", job_id))
    }

    /// Appends a timestamped line to the job's log file.
    pub fn write_log(&self, job_id: SyncJobId, message: &str) -> Result<()> {
        fs::create_dir_all(&self.log_dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_file_path(job_id))?;

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        writeln!(file, "[{}] {}", timestamp, message)?;
        Ok(())
    }

    /// Пишет строку в лог задания и в общий лог. Ошибки записи не прерывают задание.
    pub fn log(&self, job_id: SyncJobId, message: &str) {
        tracing::info!("[job {}] {}", job_id, message);
        if let Err(e) = self.write_log(job_id, message) {
            tracing::warn!("Cannot write job log for {}: {}", job_id, e);
        }
    }

    /// `None` when the job never wrote a log.
    pub fn read_log(&self, job_id: SyncJobId) -> Result<Option<String>> {
        let path = self.log_file_path(job_id);
        if path.exists() {
            Ok(Some(fs::read_to_string(&path)?))
        } else {
            Ok(None)
        }
    }

    pub fn delete_log(&self, job_id: SyncJobId) -> Result<()> {
        let path = self.log_file_path(job_id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

pub fn init_job_logger(logger: Arc<JobLogger>) {
    if JOB_LOGGER.set(logger).is_err() {
        tracing::warn!("Job logger already initialized");
    }
}

/// Process-wide job logger, next to the application log by default.
pub fn job_logger() -> Arc<JobLogger> {
    JOB_LOGGER
        .get_or_init(|| Arc::new(JobLogger::new(crate::system::tracing::log_dir())))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let logger = JobLogger::new(dir.path());
        let id = SyncJobId::new_v4();

        assert!(logger.read_log(id).unwrap().is_none());

        logger.write_log(id, "Starting product_push").unwrap();
        logger.log(id, "Pushed 2 product(s)");
        let content = logger.read_log(id).unwrap().unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("Starting product_push"));
        assert!(lines[1].ends_with("Pushed 2 product(s)"));
        assert!(logger
            .log_file_path(id)
            .starts_with(dir.path().join("job_logs")));

        logger.delete_log(id).unwrap();
        assert!(logger.read_log(id).unwrap().is_none());
    }
}
