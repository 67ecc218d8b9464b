//! Worker wire messages.
//!
//! Both directions use JSON text frames shaped as
//! `{"type": "<kind>", "data": {...}}`. Requests and responses are
//! correlated by `request_id`, which is the job id of the submission.

use serde::{Deserialize, Serialize};

/// Messages sent from the client to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    /// Run a script.
    #[serde(rename = "execute")]
    Execute(ExecuteData),
}

/// Payload for `execute` requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteData {
    pub request_id: String,
    /// Opaque script text.
    pub code: String,
    /// Client-side timeout, forwarded so the worker can give up early.
    pub timeout_ms: u64,
}

/// All known worker message types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkerMessage {
    /// Worker status broadcast.
    #[serde(rename = "status")]
    Status(StatusData),

    /// The worker picked up a request.
    #[serde(rename = "execution_start")]
    ExecutionStart(ExecutionStartData),

    /// The script finished without raising.
    #[serde(rename = "execution_success")]
    ExecutionSuccess(ExecutionSuccessData),

    /// The script raised an exception.
    #[serde(rename = "execution_error")]
    ExecutionError(ErrorData),
}

/// Payload for `status` messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusData {
    pub queue_remaining: i32,
}

/// Payload for `execution_start` messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStartData {
    pub request_id: String,
}

/// Payload for `execution_success` messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSuccessData {
    pub request_id: String,
    /// Captured script output.
    #[serde(default)]
    pub stdout: String,
    /// Names of objects added to the scene.
    #[serde(default)]
    pub created_objects: Vec<String>,
}

/// Payload for `execution_error` messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    pub request_id: String,
    pub exception_type: String,
    pub exception_message: String,
}

impl WorkerMessage {
    /// The request this message answers, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            WorkerMessage::Status(_) => None,
            WorkerMessage::ExecutionStart(data) => Some(&data.request_id),
            WorkerMessage::ExecutionSuccess(data) => Some(&data.request_id),
            WorkerMessage::ExecutionError(data) => Some(&data.request_id),
        }
    }
}

/// Parse a worker text frame.
///
/// Returns `Err` for malformed JSON or unknown `type` values. Callers
/// should log and continue.
pub fn parse_message(text: &str) -> Result<WorkerMessage, serde_json::Error> {
    serde_json::from_str(text)
}
