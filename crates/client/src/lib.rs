//! Remote script execution client.
//!
//! Sends script payloads to a long-lived worker process over a
//! [`transport::WorkerTransport`], waits for structured results with a
//! client-side timeout, retries unreachable workers with exponential
//! backoff, and records every terminal job in the session log.
//!
//! Submissions are serialized through a single slot because the worker
//! executes one script at a time against shared scene state.

pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod messages;
pub mod retry;
pub mod transport;
pub mod ws;

pub use error::ExecutionError;
pub use executor::{JobRequest, ScriptClient};
