//! Per-run session log.
//!
//! A [`SessionLog`] holds every terminal job of one session in submission
//! order. `total_count` is stored alongside the jobs because it is part of
//! the persisted document, and it must always equal `jobs.len()`.

use serde::{Deserialize, Serialize};

use crate::job::{Job, JobStatus};
use crate::types::{JobId, Timestamp};

/// Structural problems with a session log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionLogError {
    #[error("Job {id} is not terminal ({status})")]
    NotTerminal { id: JobId, status: JobStatus },

    #[error("total_count is {total_count} but the log holds {actual} jobs")]
    CountMismatch { total_count: usize, actual: usize },

    #[error("Job {0} appears more than once")]
    DuplicateJob(JobId),
}

/// Ordered record of terminal jobs for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    session_start: Timestamp,
    #[serde(alias = "assets_created")]
    jobs: Vec<Job>,
    #[serde(alias = "total_assets")]
    total_count: usize,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLog {
    /// Start an empty session stamped with the current time.
    pub fn new() -> Self {
        Self::starting_at(chrono::Utc::now())
    }

    pub fn starting_at(session_start: Timestamp) -> Self {
        Self {
            session_start,
            jobs: Vec::new(),
            total_count: 0,
        }
    }

    pub fn session_start(&self) -> Timestamp {
        self.session_start
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn last(&self) -> Option<&Job> {
        self.jobs.last()
    }

    /// Append a terminal job, keeping `total_count` in step.
    pub fn push(&mut self, job: Job) -> Result<(), SessionLogError> {
        if !job.is_terminal() {
            return Err(SessionLogError::NotTerminal {
                id: job.id(),
                status: job.status(),
            });
        }
        if self.jobs.iter().any(|existing| existing.id() == job.id()) {
            return Err(SessionLogError::DuplicateJob(job.id()));
        }
        self.jobs.push(job);
        self.total_count = self.jobs.len();
        Ok(())
    }

    /// Check the structural invariants of a log read from storage.
    pub fn validate(&self) -> Result<(), SessionLogError> {
        if self.total_count != self.jobs.len() {
            return Err(SessionLogError::CountMismatch {
                total_count: self.total_count,
                actual: self.jobs.len(),
            });
        }
        let mut seen = std::collections::HashSet::with_capacity(self.jobs.len());
        for job in &self.jobs {
            if !job.is_terminal() {
                return Err(SessionLogError::NotTerminal {
                    id: job.id(),
                    status: job.status(),
                });
            }
            if !seen.insert(job.id()) {
                return Err(SessionLogError::DuplicateJob(job.id()));
            }
        }
        Ok(())
    }

    /// Number of jobs per status, in lifecycle order, omitting zeros.
    pub fn status_counts(&self) -> Vec<(JobStatus, usize)> {
        JobStatus::ALL
            .into_iter()
            .map(|status| {
                let count = self.jobs.iter().filter(|j| j.status() == status).count();
                (status, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
