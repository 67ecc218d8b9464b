//! Scripted in-memory worker for orchestrator tests.
//!
//! Every script succeeds immediately with its own text as stdout, except:
//! `fail` raises `RuntimeError`, and `hang` never answers.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scriptrelay_client::config::ClientConfig;
use scriptrelay_client::messages::{
    ClientMessage, ErrorData, ExecutionSuccessData, WorkerMessage,
};
use scriptrelay_client::transport::{TransportError, WorkerConnection, WorkerTransport};
use scriptrelay_client::ScriptClient;
use scriptrelay_pipeline::SessionOrchestrator;
use scriptrelay_store::SessionStore;

#[derive(Clone, Default)]
pub struct ScriptedTransport {
    received: Arc<Mutex<Vec<String>>>,
}

pub struct ScriptedConnection {
    received: Arc<Mutex<Vec<String>>>,
    replies: VecDeque<WorkerMessage>,
}

impl ScriptedTransport {
    /// Scripts in the order the worker received them.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().expect("lock").clone()
    }
}

impl WorkerTransport for ScriptedTransport {
    type Connection = ScriptedConnection;

    fn endpoint(&self) -> &str {
        "scripted://worker"
    }

    async fn connect(&self) -> Result<ScriptedConnection, TransportError> {
        Ok(ScriptedConnection {
            received: Arc::clone(&self.received),
            replies: VecDeque::new(),
        })
    }
}

impl WorkerConnection for ScriptedConnection {
    async fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        let ClientMessage::Execute(req) = message;
        self.received.lock().expect("lock").push(req.code.clone());

        let reply = match req.code.as_str() {
            "hang" => return Ok(()),
            "fail" => WorkerMessage::ExecutionError(ErrorData {
                request_id: req.request_id.clone(),
                exception_type: "RuntimeError".into(),
                exception_message: "step exploded".into(),
            }),
            code => WorkerMessage::ExecutionSuccess(ExecutionSuccessData {
                request_id: req.request_id.clone(),
                stdout: code.to_string(),
                created_objects: vec![format!("{code}_obj")],
            }),
        };
        self.replies.push_back(reply);
        Ok(())
    }

    async fn recv(&mut self) -> Result<WorkerMessage, TransportError> {
        match self.replies.pop_front() {
            Some(reply) => Ok(reply),
            None => std::future::pending().await,
        }
    }
}

/// Orchestrator over a fresh session store in `dir`.
pub async fn orchestrator(
    dir: &std::path::Path,
    step_timeout: Duration,
) -> (SessionOrchestrator<ScriptedTransport>, ScriptedTransport) {
    let transport = ScriptedTransport::default();
    let store = Arc::new(SessionStore::create(dir).await.expect("store"));
    let client = ScriptClient::new(transport.clone(), ClientConfig::default(), store);
    (
        SessionOrchestrator::new(Arc::new(client), step_timeout),
        transport,
    )
}
