//! Fail-fast composite runs.
//!
//! [`SessionOrchestrator`] drives an ordered list of [`CompositeStep`]s
//! through a shared [`ScriptClient`]. Each step is a separate job; the next
//! step is submitted only after the previous job is terminal and recorded.

use std::sync::Arc;
use std::time::Duration;

use scriptrelay_client::transport::WorkerTransport;
use scriptrelay_client::{ExecutionError, JobRequest, ScriptClient};
use scriptrelay_core::job::ExecutionOutcome;
use scriptrelay_core::validation::validate_submission;
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;

/// One step of a composite run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeStep {
    pub label: Option<String>,
    pub payload: String,
}

impl CompositeStep {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            payload: payload.into(),
        }
    }
}

impl From<String> for CompositeStep {
    fn from(payload: String) -> Self {
        Self {
            label: None,
            payload,
        }
    }
}

impl From<&str> for CompositeStep {
    fn from(payload: &str) -> Self {
        Self::from(payload.to_string())
    }
}

/// Outcome of a composite run.
#[derive(Debug)]
pub struct CompositeResult {
    /// Steps that completed successfully.
    pub succeeded: usize,
    /// Zero-based index of the step that failed, if any.
    pub failed_at: Option<usize>,
    /// Outcomes of the successful steps, in step order.
    pub results: Vec<ExecutionOutcome>,
    /// Steps never submitted because of the failure.
    pub skipped: usize,
    /// Error of the failed step.
    pub error: Option<ExecutionError>,
    pub total_steps: usize,
}

impl CompositeResult {
    fn empty(total_steps: usize) -> Self {
        Self {
            succeeded: 0,
            failed_at: None,
            results: Vec::with_capacity(total_steps),
            skipped: 0,
            error: None,
            total_steps,
        }
    }

    /// True when every step succeeded.
    pub fn is_success(&self) -> bool {
        self.failed_at.is_none()
    }
}

/// Runs composite jobs against a single worker.
pub struct SessionOrchestrator<T: WorkerTransport> {
    client: Arc<ScriptClient<T>>,
    step_timeout: Duration,
}

impl<T: WorkerTransport> SessionOrchestrator<T> {
    /// `step_timeout` applies to every step individually.
    pub fn new(client: Arc<ScriptClient<T>>, step_timeout: Duration) -> Self {
        Self {
            client,
            step_timeout,
        }
    }

    pub fn client(&self) -> &Arc<ScriptClient<T>> {
        &self.client
    }

    /// Run `steps` in order, stopping at the first failure.
    pub async fn run_composite<S>(
        &self,
        steps: impl IntoIterator<Item = S>,
    ) -> Result<CompositeResult, PipelineError>
    where
        S: Into<CompositeStep>,
    {
        self.run_composite_with_cancel(steps, &CancellationToken::new())
            .await
    }

    /// Like [`run_composite`](Self::run_composite), but `cancel` stops the
    /// run before the next step is dispatched. The step waiting at that
    /// moment is recorded as cancelled and reported as the failed step.
    ///
    /// Every step is validated first; an invalid step fails the run with
    /// no job submitted or recorded. Storage and lifecycle failures abort
    /// the run with `Err`; every other step failure is reported in the
    /// [`CompositeResult`].
    pub async fn run_composite_with_cancel<S>(
        &self,
        steps: impl IntoIterator<Item = S>,
        cancel: &CancellationToken,
    ) -> Result<CompositeResult, PipelineError>
    where
        S: Into<CompositeStep>,
    {
        let steps: Vec<CompositeStep> = steps.into_iter().map(Into::into).collect();
        let total_steps = steps.len();
        let mut result = CompositeResult::empty(total_steps);

        // A malformed step rejects the whole run before anything reaches
        // the worker.
        for (index, step) in steps.iter().enumerate() {
            if let Err(e) = validate_submission(&step.payload, self.step_timeout) {
                tracing::warn!(step = index + 1, total_steps, error = %e, "Composite run rejected");
                result.failed_at = Some(index);
                result.skipped = total_steps - 1;
                result.error = Some(ExecutionError::Validation(e));
                return Ok(result);
            }
        }

        tracing::info!(total_steps, "Starting composite run");

        for (index, step) in steps.into_iter().enumerate() {
            let label = step.label.clone().unwrap_or_else(|| format!("step {}", index + 1));
            tracing::info!(step = index + 1, total_steps, %label, "Submitting step");

            let request = JobRequest {
                label: step.label,
                payload: step.payload,
                timeout: self.step_timeout,
            };

            match self.client.submit_job(request, cancel).await {
                Ok(outcome) => {
                    result.succeeded += 1;
                    result.results.push(outcome);
                }
                Err(ExecutionError::Storage(e)) => return Err(PipelineError::Storage(e)),
                Err(ExecutionError::Lifecycle(e)) => return Err(PipelineError::Lifecycle(e)),
                Err(e) => {
                    tracing::warn!(
                        step = index + 1,
                        total_steps,
                        %label,
                        error = %e,
                        "Composite run stopped at failed step",
                    );
                    result.failed_at = Some(index);
                    result.skipped = total_steps - index - 1;
                    result.error = Some(e);
                    return Ok(result);
                }
            }
        }

        tracing::info!(succeeded = result.succeeded, "Composite run completed");
        Ok(result)
    }
}
