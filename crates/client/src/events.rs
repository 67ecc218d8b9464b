//! Session events emitted by the client.
//!
//! Subscribers (the CLI progress view, tests) receive these through
//! [`crate::ScriptClient::subscribe`]. Delivery is best-effort: slow
//! receivers lag and nobody listening is fine.

use scriptrelay_core::job::JobStatus;
use scriptrelay_core::types::JobId;
use serde::Serialize;

/// Capacity of the broadcast channel for session events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A state change in the current session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SessionEvent {
    /// A validated submission created a `Pending` job.
    JobQueued {
        job_id: JobId,
        label: Option<String>,
    },

    /// The job acquired the worker slot.
    JobStarted { job_id: JobId },

    /// The job reached a terminal state and was recorded.
    JobFinished { job_id: JobId, status: JobStatus },

    /// A connection to the worker was established.
    WorkerConnected { endpoint: String },

    /// The connection to the worker was dropped.
    WorkerDisconnected { endpoint: String, reason: String },
}
