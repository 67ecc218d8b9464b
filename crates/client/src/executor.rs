//! Serialized script submission against a single worker.
//!
//! [`ScriptClient`] owns one worker connection slot. Each submission:
//!
//! 1. validates the request (no job exists if this fails),
//! 2. creates a `Pending` job and waits for the slot (cancellable),
//! 3. marks the job `Running`, connects and sends with bounded retry,
//! 4. waits for the matching response under the job's timeout,
//! 5. records the terminal job in the session log, still holding the slot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use scriptrelay_core::job::{ExecutionOutcome, Job};
use scriptrelay_core::validation::validate_submission;
use scriptrelay_store::SessionStore;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::ExecutionError;
use crate::events::{SessionEvent, EVENT_CHANNEL_CAPACITY};
use crate::messages::{ClientMessage, ExecuteData, WorkerMessage};
use crate::transport::{TransportError, WorkerConnection, WorkerTransport};

/// One script submission.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub label: Option<String>,
    pub payload: String,
    pub timeout: Duration,
}

impl JobRequest {
    pub fn new(payload: impl Into<String>, timeout: Duration) -> Self {
        Self {
            label: None,
            payload: payload.into(),
            timeout,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Client for a single stateful worker.
///
/// Share it behind an `Arc`; concurrent submissions queue on the slot in
/// FIFO order.
pub struct ScriptClient<T: WorkerTransport> {
    transport: T,
    config: ClientConfig,
    store: Arc<SessionStore>,
    slot: Mutex<Option<T::Connection>>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl<T: WorkerTransport> ScriptClient<T> {
    pub fn new(transport: T, config: ClientConfig, store: Arc<SessionStore>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            config,
            store,
            slot: Mutex::new(None),
            event_tx,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Submit an unlabelled script that cannot be cancelled.
    pub async fn submit(
        &self,
        payload: impl Into<String>,
        timeout: Duration,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        self.submit_job(JobRequest::new(payload, timeout), &CancellationToken::new())
            .await
    }

    /// Submit a script and wait for its outcome.
    ///
    /// Every request that passes validation leaves exactly one terminal
    /// job in the session log before this returns. `cancel` is honoured
    /// only while the job is waiting for the slot.
    pub async fn submit_job(
        &self,
        request: JobRequest,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        validate_submission(&request.payload, request.timeout)?;

        let JobRequest {
            label,
            payload,
            timeout,
        } = request;
        let mut job = Job::new(label.clone(), payload);
        let job_id = job.id();
        self.emit(SessionEvent::JobQueued { job_id, label });
        tracing::debug!(%job_id, "Job queued");

        let mut slot = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                job.cancel()?;
                tracing::info!(%job_id, "Job cancelled before dispatch");
                self.record(job).await?;
                return Err(ExecutionError::Cancelled);
            }
            guard = self.slot.lock() => guard,
        };

        job.start()?;
        self.emit(SessionEvent::JobStarted { job_id });

        let result = self.dispatch(&mut slot, &mut job, timeout).await;
        match &result {
            Ok(outcome) => {
                tracing::info!(
                    %job_id,
                    attempts = job.attempts(),
                    duration_ms = outcome.duration_ms,
                    created = outcome.created_object_names.len(),
                    "Job succeeded",
                );
                job.succeed(outcome.clone())?;
            }
            Err(e @ ExecutionError::Timeout { .. }) => {
                tracing::warn!(%job_id, error = %e, "Job timed out");
                job.time_out(e.to_string())?;
            }
            Err(e) => {
                tracing::warn!(%job_id, attempts = job.attempts(), error = %e, "Job failed");
                job.fail(e.to_string())?;
            }
        }

        self.record(job).await?;
        drop(slot);
        result
    }

    /// Establish (or keep) the worker connection without submitting a job.
    ///
    /// Uses the same retry policy as submissions and returns the number
    /// of connect attempts made (0 if a connection was already open).
    pub async fn check_connection(&self) -> Result<u32, ExecutionError> {
        let mut slot = self.slot.lock().await;
        if slot.is_some() {
            return Ok(0);
        }

        let mut backoff = self.config.retry.backoff();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let error = match self.ensure_connected(&mut slot).await {
                Ok(()) => return Ok(attempt),
                Err(e) => e,
            };
            let Some(delay) = backoff.next() else {
                return Err(ExecutionError::Connection {
                    attempts: attempt,
                    message: error.to_string(),
                });
            };
            tracing::warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Worker not reachable, retrying",
            );
            tokio::time::sleep(delay).await;
        }
    }

    // ---- private helpers ----

    /// Deliver the job's payload and await its response. Runs with the
    /// slot held.
    ///
    /// An attempt is repeated only while the worker provably has not
    /// started the script: the connect or send failed, or the connection
    /// closed before `execution_start` arrived for this request. The
    /// latter covers a reused connection the worker dropped while idle.
    async fn dispatch(
        &self,
        slot: &mut Option<T::Connection>,
        job: &mut Job,
        timeout: Duration,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let request_id = job.id().to_string();
        let message = ClientMessage::Execute(ExecuteData {
            request_id: request_id.clone(),
            code: job.payload().to_string(),
            timeout_ms: timeout.as_millis() as u64,
        });

        let mut backoff = self.config.retry.backoff();
        loop {
            job.record_attempt()?;
            let attempt = job.attempts();

            let undelivered = match self.deliver(slot, &message).await {
                Ok(()) => match self.exchange(slot, &request_id, timeout).await {
                    Ok(outcome) => return Ok(outcome),
                    Err(ResponseError::Transport {
                        error,
                        started: false,
                    }) => error,
                    Err(ResponseError::Transport {
                        error,
                        started: true,
                    }) => {
                        return Err(ExecutionError::Connection {
                            attempts: attempt,
                            message: format!(
                                "connection lost after the script started, effect unknown: {error}"
                            ),
                        });
                    }
                    Err(ResponseError::Worker {
                        exception_type,
                        message,
                    }) => {
                        return Err(ExecutionError::Worker {
                            exception_type,
                            message,
                        });
                    }
                    Err(ResponseError::TimedOut) => {
                        return Err(ExecutionError::Timeout {
                            timeout_ms: timeout.as_millis() as u64,
                        });
                    }
                },
                Err(e) => e,
            };

            let Some(delay) = backoff.next() else {
                return Err(ExecutionError::Connection {
                    attempts: attempt,
                    message: undelivered.to_string(),
                });
            };
            tracing::warn!(
                job_id = %job.id(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %undelivered,
                "Delivery failed, retrying",
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Wait for the answer to `request_id` on the open connection. A
    /// transport failure discards the connection.
    async fn exchange(
        &self,
        slot: &mut Option<T::Connection>,
        request_id: &str,
        timeout: Duration,
    ) -> Result<ExecutionOutcome, ResponseError> {
        let Some(conn) = slot.as_mut() else {
            return Err(ResponseError::Transport {
                error: TransportError::Closed,
                started: false,
            });
        };

        let sent_at = Instant::now();
        let result = match tokio::time::timeout(timeout, await_response(conn, request_id)).await {
            Ok(result) => result,
            Err(_elapsed) => return Err(ResponseError::TimedOut),
        };

        match result {
            Ok(mut outcome) => {
                outcome.duration_ms = sent_at.elapsed().as_millis() as u64;
                Ok(outcome)
            }
            Err(ResponseError::Transport { error, started }) => {
                self.drop_connection(slot, &error);
                Err(ResponseError::Transport { error, started })
            }
            Err(e) => Err(e),
        }
    }

    /// Connect if needed, then send. Any failure here means the worker
    /// never received the message, and the connection is discarded.
    async fn deliver(
        &self,
        slot: &mut Option<T::Connection>,
        message: &ClientMessage,
    ) -> Result<(), TransportError> {
        self.ensure_connected(slot).await?;
        let Some(conn) = slot.as_mut() else {
            return Err(TransportError::Closed);
        };
        if let Err(e) = conn.send(message).await {
            self.drop_connection(slot, &e);
            return Err(e);
        }
        Ok(())
    }

    async fn ensure_connected(&self, slot: &mut Option<T::Connection>) -> Result<(), TransportError> {
        if slot.is_some() {
            return Ok(());
        }

        let conn = tokio::time::timeout(self.config.connect_timeout, self.transport.connect())
            .await
            .map_err(|_| {
                TransportError::Connect(format!(
                    "timed out after {}ms connecting to {}",
                    self.config.connect_timeout.as_millis(),
                    self.transport.endpoint(),
                ))
            })??;

        *slot = Some(conn);
        self.emit(SessionEvent::WorkerConnected {
            endpoint: self.transport.endpoint().to_string(),
        });
        Ok(())
    }

    fn drop_connection(&self, slot: &mut Option<T::Connection>, reason: &TransportError) {
        if slot.take().is_some() {
            tracing::warn!(
                endpoint = self.transport.endpoint(),
                error = %reason,
                "Dropping worker connection",
            );
            self.emit(SessionEvent::WorkerDisconnected {
                endpoint: self.transport.endpoint().to_string(),
                reason: reason.to_string(),
            });
        }
    }

    async fn record(&self, job: Job) -> Result<(), ExecutionError> {
        let job_id = job.id();
        let status = job.status();
        self.store.append(job).await?;
        self.emit(SessionEvent::JobFinished { job_id, status });
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

enum ResponseError {
    Worker {
        exception_type: String,
        message: String,
    },
    /// `started` is true once the worker acknowledged this request.
    Transport {
        error: TransportError,
        started: bool,
    },
    TimedOut,
}

/// Read worker messages until the one answering `request_id` arrives.
///
/// Answers to other (earlier, timed-out) requests are discarded.
async fn await_response<C: WorkerConnection>(
    conn: &mut C,
    request_id: &str,
) -> Result<ExecutionOutcome, ResponseError> {
    let mut started = false;
    loop {
        let msg = conn
            .recv()
            .await
            .map_err(|error| ResponseError::Transport { error, started })?;

        if let Some(id) = msg.request_id() {
            if id != request_id {
                tracing::warn!(
                    request_id = id,
                    current = request_id,
                    "Discarding stale worker response",
                );
                continue;
            }
        }

        match msg {
            WorkerMessage::Status(data) => {
                tracing::debug!(queue_remaining = data.queue_remaining, "Worker status");
            }
            WorkerMessage::ExecutionStart(_) => {
                started = true;
                tracing::debug!(request_id, "Worker started executing");
            }
            WorkerMessage::ExecutionSuccess(data) => {
                return Ok(ExecutionOutcome {
                    stdout_text: data.stdout,
                    created_object_names: data.created_objects,
                    duration_ms: 0,
                });
            }
            WorkerMessage::ExecutionError(data) => {
                return Err(ResponseError::Worker {
                    exception_type: data.exception_type,
                    message: data.exception_message,
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
