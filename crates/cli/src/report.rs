//! Plain-text rendering of results, session logs and progress events.

use std::fmt::Write;
use std::path::Path;

use scriptrelay_client::events::SessionEvent;
use scriptrelay_core::job::{Job, JobStatus};
use scriptrelay_core::session::SessionLog;
use scriptrelay_pipeline::{CompositeResult, CompositeStep};
use scriptrelay_store::SessionListing;

const RULE: &str = "==================================================";

/// One progress line per interesting event.
pub fn event_line(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::JobQueued { label, .. } => {
            Some(format!("-> {}", label.as_deref().unwrap_or("(unlabelled)")))
        }
        SessionEvent::JobStarted { .. } => None,
        SessionEvent::JobFinished { status, .. } => Some(format!("   {status}")),
        SessionEvent::WorkerConnected { endpoint } => Some(format!("Connected to worker at {endpoint}")),
        SessionEvent::WorkerDisconnected { endpoint, reason } => {
            Some(format!("Lost connection to {endpoint}: {reason}"))
        }
    }
}

/// Summary of a composite run. Step numbers are one-based.
pub fn composite_summary(result: &CompositeResult, steps: &[CompositeStep]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Composite run: {}/{} step(s) succeeded",
        result.succeeded, result.total_steps
    );

    for (i, outcome) in result.results.iter().enumerate() {
        let _ = write!(out, "  {}. {} ({}ms)", i + 1, step_name(steps, i), outcome.duration_ms);
        if !outcome.created_object_names.is_empty() {
            let _ = write!(out, " created: {}", outcome.created_object_names.join(", "));
        }
        out.push('\n');
    }

    if let Some(index) = result.failed_at {
        let _ = write!(out, "  Failed at step {} ({})", index + 1, step_name(steps, index));
        if let Some(error) = &result.error {
            let _ = write!(out, ": {error}");
        }
        out.push('\n');
        if result.skipped > 0 {
            let _ = writeln!(out, "  Skipped {} other step(s)", result.skipped);
        }
    }
    out
}

/// Every job of a session log, numbered in recording order.
pub fn session_view(log: &SessionLog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SESSION JOBS\n{RULE}");

    if log.is_empty() {
        let _ = writeln!(out, "No jobs recorded in this session.");
        return out;
    }

    for (i, job) in log.jobs().iter().enumerate() {
        let _ = writeln!(out, "{}. {} [{}]", i + 1, job_name(job), job.status());
        let _ = writeln!(
            out,
            "   Submitted: {}",
            job.submitted_at().format("%Y-%m-%d %H:%M:%S")
        );
        if job.attempts() > 1 {
            let _ = writeln!(out, "   Attempts: {}", job.attempts());
        }
        if let Some(result) = job.result() {
            let _ = writeln!(out, "   Duration: {}ms", result.duration_ms);
            if !result.created_object_names.is_empty() {
                let _ = writeln!(out, "   Created: {}", result.created_object_names.join(", "));
            }
        }
        if let Some(error) = job.error() {
            let _ = writeln!(out, "   Error: {error}");
        }
    }
    out
}

/// Headline figures and per-status breakdown of a session.
pub fn session_report(log: &SessionLog, path: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SESSION REPORT\n{RULE}");
    let _ = writeln!(
        out,
        "Session started: {}",
        log.session_start().format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "Total jobs: {}", log.total_count());
    let _ = writeln!(out, "Session log: {}", path.display());

    if log.is_empty() {
        return out;
    }

    let _ = writeln!(out, "\nStatus breakdown:");
    for (status, count) in log.status_counts() {
        let _ = writeln!(out, "  {status}: {count}");
    }

    let succeeded = log
        .jobs()
        .iter()
        .filter(|job| job.status() == JobStatus::Succeeded)
        .count();
    let created: usize = log
        .jobs()
        .iter()
        .filter_map(Job::result)
        .map(|result| result.created_object_names.len())
        .sum();
    let _ = writeln!(
        out,
        "\nSuccess rate: {:.0}%",
        succeeded as f64 * 100.0 / log.total_count() as f64
    );
    let _ = writeln!(out, "Objects created: {created}");
    out
}

/// One line per prior session; corrupt files are listed with the reason.
pub fn session_listing(listings: &[SessionListing]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "PRIOR SESSIONS\n{RULE}");

    if listings.is_empty() {
        let _ = writeln!(out, "No session logs found.");
        return out;
    }

    for listing in listings {
        let name = listing
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match listing {
            SessionListing::Summary(summary) => {
                let breakdown: Vec<String> = summary
                    .status_counts
                    .iter()
                    .map(|(status, count)| format!("{count} {status}"))
                    .collect();
                let _ = write!(
                    out,
                    "{name}  {}  {} job(s)",
                    summary.session_start.format("%Y-%m-%d %H:%M:%S"),
                    summary.total_count
                );
                if !breakdown.is_empty() {
                    let _ = write!(out, " ({})", breakdown.join(", "));
                }
                out.push('\n');
            }
            SessionListing::Corrupt { reason, .. } => {
                let _ = writeln!(out, "{name}  CORRUPT: {reason}");
            }
        }
    }
    out
}

fn step_name(steps: &[CompositeStep], index: usize) -> String {
    steps
        .get(index)
        .and_then(|step| step.label.clone())
        .unwrap_or_else(|| format!("step {}", index + 1))
}

fn job_name(job: &Job) -> String {
    match job.label() {
        Some(label) => label.to_string(),
        None => {
            let first_line = job.payload().lines().next().unwrap_or_default().trim();
            let mut name: String = first_line.chars().take(40).collect();
            if first_line.chars().count() > 40 {
                name.push_str("...");
            }
            name
        }
    }
}
