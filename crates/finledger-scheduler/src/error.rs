use thiserror::Error;

/// Construction errors. Scheduling itself never fails.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `ReminderScheduler::new` was called outside a Tokio runtime.
    #[error("No Tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
