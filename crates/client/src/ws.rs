//! WebSocket transport to the worker.
//!
//! [`WsTransport`] holds the worker endpoint. Each call to
//! [`connect`](WorkerTransport::connect) yields a [`WsConnection`] that
//! exchanges JSON text frames (see [`crate::messages`]).

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::messages::{parse_message, ClientMessage, WorkerMessage};
use crate::transport::{TransportError, WorkerConnection, WorkerTransport};

/// Connection settings for a worker reachable over WebSocket.
#[derive(Debug, Clone)]
pub struct WsTransport {
    url: String,
}

/// A live WebSocket connection to the worker.
pub struct WsConnection {
    url: String,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTransport {
    /// `url` is the full endpoint, e.g. `ws://127.0.0.1:9876`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl WorkerTransport for WsTransport {
    type Connection = WsConnection;

    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn connect(&self) -> Result<WsConnection, TransportError> {
        let (stream, _response) = connect_async(self.url.as_str()).await.map_err(|e| {
            TransportError::Connect(format!("Failed to connect to worker at {}: {e}", self.url))
        })?;

        tracing::info!(endpoint = %self.url, "Connected to worker");

        Ok(WsConnection {
            url: self.url.clone(),
            stream,
        })
    }
}

impl WorkerConnection for WsConnection {
    async fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        let text =
            serde_json::to_string(message).map_err(|e| TransportError::Protocol(e.to_string()))?;
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Result<WorkerMessage, TransportError> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match parse_message(&text) {
                    Ok(msg) => return Ok(msg),
                    Err(e) => {
                        tracing::warn!(
                            endpoint = %self.url,
                            error = %e,
                            "Skipping unparseable worker message",
                        );
                    }
                },
                Ok(Message::Close(frame)) => {
                    tracing::info!(endpoint = %self.url, ?frame, "Worker closed the connection");
                    return Err(TransportError::Closed);
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(endpoint = %self.url, "Ignoring binary frame from worker");
                }
                // Ping/Pong are answered by tungstenite itself.
                Ok(_) => {}
                Err(e) => return Err(TransportError::Receive(e.to_string())),
            }
        }
        Err(TransportError::Closed)
    }
}
