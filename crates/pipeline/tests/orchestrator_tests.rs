//! Integration tests for fail-fast composite runs.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use scriptrelay_client::ExecutionError;
use scriptrelay_core::job::JobStatus;
use scriptrelay_pipeline::{CompositeStep, PipelineError};
use tokio_util::sync::CancellationToken;

const STEP_TIMEOUT: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// Test: all steps succeed in order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn all_steps_succeed_in_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (orchestrator, worker) = common::orchestrator(dir.path(), STEP_TIMEOUT).await;

    let steps = vec![
        CompositeStep::new("environment", "env"),
        CompositeStep::new("vehicle", "car"),
        CompositeStep::new("character", "hero"),
    ];
    let result = orchestrator.run_composite(steps).await.expect("run");

    assert!(result.is_success());
    assert_eq!(result.succeeded, 3);
    assert_eq!(result.failed_at, None);
    assert_eq!(result.skipped, 0);
    assert_eq!(result.total_steps, 3);
    let stdout: Vec<_> = result.results.iter().map(|r| r.stdout_text.as_str()).collect();
    assert_eq!(stdout, vec!["env", "car", "hero"]);
    assert_eq!(worker.received(), vec!["env", "car", "hero"]);

    let log = orchestrator.client().store().snapshot().await;
    let labels: Vec<_> = log.jobs().iter().map(|j| j.label()).collect();
    assert_eq!(labels, vec![Some("environment"), Some("vehicle"), Some("character")]);
}

// ---------------------------------------------------------------------------
// Test: failure at step k stops the run and skips the rest
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failure_stops_run_and_skips_remaining_steps() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (orchestrator, worker) = common::orchestrator(dir.path(), STEP_TIMEOUT).await;

    let result = orchestrator
        .run_composite(["one", "fail", "three", "four"])
        .await
        .expect("run");

    assert_eq!(result.succeeded, 1);
    assert_eq!(result.failed_at, Some(1));
    assert_eq!(result.skipped, 2);
    assert_eq!(result.results.len(), 1);
    assert_matches!(
        result.error,
        Some(ExecutionError::Worker { ref exception_type, .. }) if exception_type == "RuntimeError"
    );
    assert_eq!(worker.received(), vec!["one", "fail"]);

    let log = orchestrator.client().store().snapshot().await;
    let statuses: Vec<_> = log.jobs().iter().map(|j| j.status()).collect();
    assert_eq!(statuses, vec![JobStatus::Succeeded, JobStatus::Failed]);
}

#[tokio::test]
async fn timed_out_step_is_reported_as_failure() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (orchestrator, worker) = common::orchestrator(dir.path(), STEP_TIMEOUT).await;

    let result = orchestrator
        .run_composite(vec!["ok".to_string(), "hang".to_string(), "never".to_string()])
        .await
        .expect("run");

    assert_eq!(result.failed_at, Some(1));
    assert_matches!(result.error, Some(ExecutionError::Timeout { timeout_ms: 200 }));
    assert_eq!(worker.received(), vec!["ok", "hang"]);

    let log = orchestrator.client().store().snapshot().await;
    assert_eq!(log.jobs()[1].status(), JobStatus::TimedOut);
}

// ---------------------------------------------------------------------------
// Test: invalid step rejects the whole run up front
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_step_rejects_the_run_before_any_submission() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (orchestrator, worker) = common::orchestrator(dir.path(), STEP_TIMEOUT).await;

    let result = orchestrator
        .run_composite(["first", "   ", "third"])
        .await
        .expect("run");

    assert_eq!(result.succeeded, 0);
    assert_eq!(result.failed_at, Some(1));
    assert_eq!(result.skipped, 2);
    assert!(result.results.is_empty());
    assert_matches!(result.error, Some(ExecutionError::Validation(_)));
    assert!(worker.received().is_empty());
    assert!(orchestrator.client().store().snapshot().await.is_empty());
}

// ---------------------------------------------------------------------------
// Test: empty composite
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_composite_submits_nothing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (orchestrator, worker) = common::orchestrator(dir.path(), STEP_TIMEOUT).await;

    let result = orchestrator
        .run_composite(Vec::<CompositeStep>::new())
        .await
        .expect("run");

    assert!(result.is_success());
    assert_eq!(result.succeeded, 0);
    assert_eq!(result.total_steps, 0);
    assert!(worker.received().is_empty());
    assert!(!orchestrator.client().store().path().exists());
}

// ---------------------------------------------------------------------------
// Test: cancellation and storage failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_run_records_cancelled_step() {
    let dir = tempfile::tempdir().expect("temp dir");
    let (orchestrator, worker) = common::orchestrator(dir.path(), STEP_TIMEOUT).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = orchestrator
        .run_composite_with_cancel(["a", "b"], &cancel)
        .await
        .expect("run");

    assert_eq!(result.failed_at, Some(0));
    assert_eq!(result.skipped, 1);
    assert_matches!(result.error, Some(ExecutionError::Cancelled));
    assert!(worker.received().is_empty());

    let log = orchestrator.client().store().snapshot().await;
    assert_eq!(log.jobs()[0].status(), JobStatus::Cancelled);
}

#[tokio::test]
async fn storage_failure_aborts_the_run() {
    let dir = tempfile::tempdir().expect("temp dir");
    let session_dir = dir.path().join("sessions");
    let (orchestrator, worker) = common::orchestrator(&session_dir, STEP_TIMEOUT).await;
    std::fs::remove_dir_all(&session_dir).expect("remove session dir");

    assert_matches!(
        orchestrator.run_composite(["one", "two"]).await,
        Err(PipelineError::Storage(_))
    );
    assert_eq!(worker.received(), vec!["one"]);
}
