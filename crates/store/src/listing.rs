//! Enumeration of prior session documents.

use std::path::{Path, PathBuf};

use scriptrelay_core::job::JobStatus;
use scriptrelay_core::types::Timestamp;

use crate::error::StoreError;
use crate::store::{load, SESSION_FILE_EXTENSION};

/// Headline figures of one readable session document.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub path: PathBuf,
    pub session_start: Timestamp,
    pub total_count: usize,
    /// Jobs per status, zero buckets omitted.
    pub status_counts: Vec<(JobStatus, usize)>,
}

/// One entry of [`list_sessions`].
///
/// Unreadable documents are reported, not skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionListing {
    Summary(SessionSummary),
    Corrupt { path: PathBuf, reason: String },
}

impl SessionListing {
    pub fn path(&self) -> &Path {
        match self {
            SessionListing::Summary(summary) => &summary.path,
            SessionListing::Corrupt { path, .. } => path,
        }
    }
}

/// Summarise every `*.json` session document in `directory`, sorted by
/// file name (which sorts by session start).
///
/// A missing directory yields an empty list.
pub async fn list_sessions(directory: impl AsRef<Path>) -> Result<Vec<SessionListing>, StoreError> {
    let directory = directory.as_ref();

    let mut entries = match tokio::fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(directory, e)),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::io(directory, e))?
    {
        let path = entry.path();
        let is_json = path.extension().and_then(|ext| ext.to_str()) == Some(SESSION_FILE_EXTENSION);
        if is_json && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut listings = Vec::with_capacity(paths.len());
    for path in paths {
        let listing = match load(&path).await {
            Ok(log) => SessionListing::Summary(SessionSummary {
                session_start: log.session_start(),
                total_count: log.total_count(),
                status_counts: log.status_counts(),
                path,
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable session log");
                let reason = match e {
                    StoreError::CorruptLog { reason, .. } => reason,
                    other => other.to_string(),
                };
                SessionListing::Corrupt { path, reason }
            }
        };
        listings.push(listing);
    }

    Ok(listings)
}
