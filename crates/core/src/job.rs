//! Job record and lifecycle state machine.
//!
//! A [`Job`] is created `Pending` at submission, moves to `Running` when
//! it is dispatched to the worker, and ends in exactly one terminal
//! state. Transitions are only possible through the methods on [`Job`];
//! once terminal, every further transition is rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{new_job_id, JobId, Timestamp};

/// Lifecycle status of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, waiting for the worker slot.
    Pending,
    /// Dispatched to the worker.
    Running,
    /// The worker reported success.
    Succeeded,
    /// Connection loss or a script-level error reported by the worker.
    Failed,
    /// No response within the job timeout. The remote effect is unknown.
    TimedOut,
    /// Cancelled by the caller before dispatch.
    Cancelled,
}

impl JobStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Succeeded,
        JobStatus::Failed,
        JobStatus::TimedOut,
        JobStatus::Cancelled,
    ];

    /// Whether this status ends the job's lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::TimedOut | JobStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::TimedOut => "timed_out",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured output returned by the worker for a successful script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Everything the script printed.
    pub stdout_text: String,
    /// Names of the objects the script created in the remote scene.
    #[serde(default)]
    pub created_object_names: Vec<String>,
    /// Round-trip time measured by the client, in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("Job {id} is already terminal ({status})")]
    AlreadyTerminal { id: JobId, status: JobStatus },

    #[error("Job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
}

/// One submitted script payload and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    payload: String,
    submitted_at: Timestamp,
    #[serde(default)]
    started_at: Option<Timestamp>,
    #[serde(default)]
    finished_at: Option<Timestamp>,
    status: JobStatus,
    #[serde(default)]
    attempts: u32,
    #[serde(default)]
    result: Option<ExecutionOutcome>,
    #[serde(default)]
    error: Option<String>,
}

impl Job {
    /// Create a new `Pending` job stamped with the current time.
    pub fn new(label: Option<String>, payload: impl Into<String>) -> Self {
        Self {
            id: new_job_id(),
            label,
            payload: payload.into(),
            submitted_at: chrono::Utc::now(),
            started_at: None,
            finished_at: None,
            status: JobStatus::Pending,
            attempts: 0,
            result: None,
            error: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<Timestamp> {
        self.finished_at
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Number of dispatch attempts made (connection retries included).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn result(&self) -> Option<&ExecutionOutcome> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `Pending -> Running`.
    pub fn start(&mut self) -> Result<(), JobError> {
        self.transition(JobStatus::Pending, JobStatus::Running)?;
        self.started_at = Some(chrono::Utc::now());
        Ok(())
    }

    /// Count one more dispatch attempt. Only valid while `Running`.
    pub fn record_attempt(&mut self) -> Result<(), JobError> {
        self.ensure_status(JobStatus::Running, JobStatus::Running)?;
        self.attempts += 1;
        Ok(())
    }

    /// `Running -> Succeeded`.
    pub fn succeed(&mut self, outcome: ExecutionOutcome) -> Result<(), JobError> {
        self.transition(JobStatus::Running, JobStatus::Succeeded)?;
        self.result = Some(outcome);
        self.finished_at = Some(chrono::Utc::now());
        Ok(())
    }

    /// `Running -> Failed`.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), JobError> {
        self.transition(JobStatus::Running, JobStatus::Failed)?;
        self.error = Some(message.into());
        self.finished_at = Some(chrono::Utc::now());
        Ok(())
    }

    /// `Running -> TimedOut`.
    pub fn time_out(&mut self, message: impl Into<String>) -> Result<(), JobError> {
        self.transition(JobStatus::Running, JobStatus::TimedOut)?;
        self.error = Some(message.into());
        self.finished_at = Some(chrono::Utc::now());
        Ok(())
    }

    /// `Pending -> Cancelled`. A running job cannot be cancelled.
    pub fn cancel(&mut self) -> Result<(), JobError> {
        self.transition(JobStatus::Pending, JobStatus::Cancelled)?;
        self.error = Some("Cancelled before dispatch".to_string());
        self.finished_at = Some(chrono::Utc::now());
        Ok(())
    }

    fn transition(&mut self, from: JobStatus, to: JobStatus) -> Result<(), JobError> {
        self.ensure_status(from, to)?;
        self.status = to;
        Ok(())
    }

    fn ensure_status(&self, expected: JobStatus, to: JobStatus) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(JobError::AlreadyTerminal {
                id: self.id,
                status: self.status,
            });
        }
        if self.status != expected {
            return Err(JobError::InvalidTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
