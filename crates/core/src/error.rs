use crate::types::JobId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Job {0} is already on the roster")]
    DuplicateJob(JobId),

    #[error("Validation failed: {0}")]
    Validation(String),
}
