//! Scheduler error types

use shomer_domain::ShomerError;
use thiserror::Error;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler is already running
    #[error("scheduler already running")]
    AlreadyRunning,

    /// Scheduler is not running
    #[error("scheduler not running")]
    NotRunning,

    /// Failed to create scheduler
    #[error("failed to create scheduler: {0}")]
    CreationFailed(String),

    /// Failed to start scheduler
    #[error("failed to start scheduler: {0}")]
    StartFailed(String),

    /// Failed to stop scheduler
    #[error("failed to stop scheduler: {0}")]
    StopFailed(String),

    /// Failed to register the sweep job
    #[error("failed to register job: {0}")]
    JobRegistrationFailed(String),

    /// Operation timed out
    #[error("operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Task join failed
    #[error("task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let domain_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                ShomerError::InvalidInput(err.to_string())
            }
            _ => ShomerError::Internal(err.to_string()),
        };
        InfraError(domain_err)
    }
}

impl From<SchedulerError> for ShomerError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
