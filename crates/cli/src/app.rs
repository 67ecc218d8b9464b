//! Wiring of store, client and orchestrator for one CLI session.

use std::io::Write;
use std::sync::Arc;

use scriptrelay_client::transport::WorkerTransport;
use scriptrelay_client::ws::WsTransport;
use scriptrelay_client::ScriptClient;
use scriptrelay_pipeline::{CompositeResult, CompositeStep, SessionOrchestrator};
use scriptrelay_store::{SessionStore, StoreError};

use crate::config::CliConfig;
use crate::report;

/// Everything a session needs, created once per process.
pub struct App<T: WorkerTransport> {
    orchestrator: SessionOrchestrator<T>,
    config: CliConfig,
}

impl App<WsTransport> {
    /// Prepare a new session log and a WebSocket client for the
    /// configured worker. Does not connect yet.
    pub async fn start(config: CliConfig) -> Result<Self, StoreError> {
        let store = Arc::new(SessionStore::create(&config.session_dir).await?);
        let transport = WsTransport::new(config.client.worker_url.clone());
        Ok(Self::new(transport, store, config))
    }
}

impl<T: WorkerTransport> App<T> {
    pub fn new(transport: T, store: Arc<SessionStore>, config: CliConfig) -> Self {
        let client = ScriptClient::new(transport, config.client.clone(), store);
        let orchestrator =
            SessionOrchestrator::new(Arc::new(client), config.client.default_timeout);
        Self {
            orchestrator,
            config,
        }
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<ScriptClient<T>> {
        self.orchestrator.client()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        self.client().store()
    }

    /// Run `steps` as one composite job, printing progress and a summary
    /// to `out`.
    ///
    /// Step failures are part of the returned result; `Err` means the
    /// session cannot continue.
    pub async fn run_steps<W: Write>(
        &self,
        steps: Vec<CompositeStep>,
        out: &mut W,
    ) -> anyhow::Result<CompositeResult> {
        let mut events = self.client().subscribe();
        let run = self.orchestrator.run_composite(steps.clone());
        tokio::pin!(run);

        let result = loop {
            tokio::select! {
                result = &mut run => break result?,
                event = events.recv() => {
                    if let Some(line) = event.ok().as_ref().and_then(report::event_line) {
                        writeln!(out, "{line}")?;
                    }
                }
            }
        };
        while let Ok(event) = events.try_recv() {
            if let Some(line) = report::event_line(&event) {
                writeln!(out, "{line}")?;
            }
        }

        write!(out, "{}", report::composite_summary(&result, &steps))?;
        out.flush()?;
        Ok(result)
    }
}
