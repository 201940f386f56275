use invoicer_core::error::CoreError;
use invoicer_core::job::JobId;

/// Job-level failures, as opposed to per-item failures which are reported
/// through progress events.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The profile cannot drive the job. Surfaces before any item runs.
    #[error("{0}")]
    Configuration(String),

    /// Another job holds the same id.
    #[error("A job is already running for {0}")]
    AlreadyRunning(JobId),
}

impl From<CoreError> for JobError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => JobError::Configuration(msg),
            other => JobError::Configuration(other.to_string()),
        }
    }
}
