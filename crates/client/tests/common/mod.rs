//! In-process WebSocket worker used by the client integration tests.
//!
//! Speaks the worker wire protocol and interprets the script text as a
//! tiny command language:
//!
//! | Script                  | Behaviour                                   |
//! |-------------------------|---------------------------------------------|
//! | `sleep <ms>`            | succeed after `<ms>` milliseconds           |
//! | `create <name>...`      | succeed reporting the named objects         |
//! | `raise <type> <msg...>` | report an exception                         |
//! | `garbage`               | send a malformed frame, then succeed        |
//! | `hangup`                | close the connection without answering      |
//! | anything else           | succeed immediately with stdout `ok`        |
//!
//! Requests on one connection are handled one at a time, like a
//! single-threaded scene host. [`spawn_one_shot_worker`] closes each
//! connection after answering its first request.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use scriptrelay_client::messages::{
    ClientMessage, ErrorData, ExecutionStartData, ExecutionSuccessData, StatusData, WorkerMessage,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

/// Handle to a running test worker.
pub struct TestWorker {
    pub url: String,
    received: Arc<Mutex<Vec<String>>>,
}

impl TestWorker {
    /// Script texts in the order the worker received them.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().expect("lock").clone()
    }
}

/// Bind an ephemeral port and serve connections until the test ends.
pub async fn spawn_worker() -> TestWorker {
    start(false).await
}

/// Like [`spawn_worker`], but every connection is closed by the worker
/// once it has answered one request.
pub async fn spawn_one_shot_worker() -> TestWorker {
    start(true).await
}

async fn start(one_shot: bool) -> TestWorker {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let received = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&received);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve(stream, Arc::clone(&log), one_shot));
        }
    });

    TestWorker {
        url: format!("ws://{addr}"),
        received,
    }
}

/// A URL on which nothing is listening.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("ws://{addr}")
}

async fn serve(stream: TcpStream, received: Arc<Mutex<Vec<String>>>, one_shot: bool) {
    let mut ws = tokio_tungstenite::accept_async(stream)
        .await
        .expect("handshake");

    send(&mut ws, &WorkerMessage::Status(StatusData { queue_remaining: 0 })).await;

    while let Some(Ok(frame)) = ws.next().await {
        let Message::Text(text) = frame else { continue };
        let msg: ClientMessage = serde_json::from_str(&text).expect("client message");
        let ClientMessage::Execute(req) = msg;
        received.lock().expect("lock").push(req.code.clone());

        send(
            &mut ws,
            &WorkerMessage::ExecutionStart(ExecutionStartData {
                request_id: req.request_id.clone(),
            }),
        )
        .await;

        let mut words = req.code.split_whitespace();
        let reply = match words.next() {
            Some("sleep") => {
                let ms = words.next().and_then(|w| w.parse().ok()).unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                success(&req.request_id, format!("slept {ms}"), vec![])
            }
            Some("create") => success(
                &req.request_id,
                "created".into(),
                words.map(str::to_string).collect(),
            ),
            Some("raise") => WorkerMessage::ExecutionError(ErrorData {
                request_id: req.request_id.clone(),
                exception_type: words.next().unwrap_or("Exception").to_string(),
                exception_message: words.collect::<Vec<_>>().join(" "),
            }),
            Some("garbage") => {
                let _ = ws.send(Message::Text("{ not json".into())).await;
                let _ = ws
                    .send(Message::Text(r#"{"type":"mystery","data":{}}"#.into()))
                    .await;
                success(&req.request_id, "ok".into(), vec![])
            }
            Some("hangup") => {
                let _ = ws.close(None).await;
                return;
            }
            _ => success(&req.request_id, "ok".into(), vec![]),
        };
        send(&mut ws, &reply).await;

        if one_shot {
            let _ = ws.close(None).await;
            return;
        }
    }
}

fn success(request_id: &str, stdout: String, created_objects: Vec<String>) -> WorkerMessage {
    WorkerMessage::ExecutionSuccess(ExecutionSuccessData {
        request_id: request_id.to_string(),
        stdout,
        created_objects,
    })
}

async fn send(ws: &mut tokio_tungstenite::WebSocketStream<TcpStream>, msg: &WorkerMessage) {
    let text = serde_json::to_string(msg).expect("encode");
    // The client may already be gone after a timeout.
    let _ = ws.send(Message::Text(text)).await;
}
