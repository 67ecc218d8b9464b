//! Worker transport seam.
//!
//! [`WorkerTransport`] opens connections; a [`WorkerConnection`] carries
//! one request/response exchange at a time. The production implementation
//! is [`crate::ws::WsTransport`].

use std::future::Future;

use crate::messages::{ClientMessage, WorkerMessage};

/// Errors raised by a transport implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The worker could not be reached.
    #[error("Connection error: {0}")]
    Connect(String),

    /// Writing a request failed. The worker did not receive it.
    #[error("Send error: {0}")]
    Send(String),

    /// The worker closed the connection.
    #[error("Connection closed by worker")]
    Closed,

    /// Reading from an established connection failed.
    #[error("Receive error: {0}")]
    Receive(String),

    /// A message could not be encoded.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Factory for worker connections.
pub trait WorkerTransport: Send + Sync {
    type Connection: WorkerConnection;

    /// Human-readable address of the worker, used in logs and events.
    fn endpoint(&self) -> &str;

    /// Open a fresh connection.
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// An established connection to the worker.
pub trait WorkerConnection: Send {
    /// Deliver one message.
    fn send(
        &mut self,
        message: &ClientMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Wait for the next well-formed worker message.
    ///
    /// Implementations skip frames they cannot parse and return
    /// [`TransportError::Closed`] once the worker goes away. Must be
    /// cancel-safe: dropping the future may not lose a message.
    fn recv(&mut self) -> impl Future<Output = Result<WorkerMessage, TransportError>> + Send;
}
