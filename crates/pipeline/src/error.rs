use scriptrelay_core::job::JobError;
use scriptrelay_store::StoreError;

/// Failures that abort a composite run instead of being reported in its
/// result. The session cannot safely continue after either.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Session log write failed: {0}")]
    Storage(#[from] StoreError),

    #[error("Job lifecycle violation: {0}")]
    Lifecycle(#[from] JobError),
}
