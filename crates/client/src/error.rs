use scriptrelay_core::error::CoreError;
use scriptrelay_core::job::JobError;
use scriptrelay_store::StoreError;

/// Failure of a single submission.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// Rejected before any job was created.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// The worker could not be reached, or the connection dropped after
    /// the worker started the script.
    #[error("Worker connection failed after {attempts} attempt(s): {message}")]
    Connection { attempts: u32, message: String },

    /// No response arrived within the timeout.
    #[error("No response from worker within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The script raised on the worker.
    #[error("{exception_type}: {message}")]
    Worker {
        exception_type: String,
        message: String,
    },

    /// Cancelled while waiting for the worker slot.
    #[error("Cancelled before dispatch")]
    Cancelled,

    /// The terminal record could not be persisted.
    #[error("Session log write failed: {0}")]
    Storage(#[from] StoreError),

    #[error("Job lifecycle violation: {0}")]
    Lifecycle(#[from] JobError),
}

impl ExecutionError {
    /// Errors after which the session must not continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecutionError::Storage(_) | ExecutionError::Lifecycle(_))
    }
}
