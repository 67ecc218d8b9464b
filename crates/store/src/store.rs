//! Append-only session store with atomic, fsync'd rewrites.

use std::path::{Path, PathBuf};

use scriptrelay_core::job::Job;
use scriptrelay_core::session::SessionLog;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::StoreError;

/// File-name prefix shared by every session document.
pub const SESSION_FILE_PREFIX: &str = "session_";

/// Extension of session documents. Temporary files use `json.tmp`.
pub const SESSION_FILE_EXTENSION: &str = "json";

/// Handle to the session log of the running session.
///
/// Create one per run with [`SessionStore::create`] and share it behind an
/// `Arc`. The document is written lazily: nothing touches the disk until
/// the first [`append`](Self::append).
pub struct SessionStore {
    path: PathBuf,
    log: Mutex<SessionLog>,
}

impl SessionStore {
    /// Prepare a new session inside `directory`, creating it if needed.
    pub async fn create(directory: impl AsRef<Path>) -> Result<Self, StoreError> {
        let directory = directory.as_ref();
        tokio::fs::create_dir_all(directory)
            .await
            .map_err(|e| StoreError::io(directory, e))?;

        let log = SessionLog::new();
        let path = directory.join(session_file_name(&log));

        tracing::info!(path = %path.display(), "Session log prepared");

        Ok(Self {
            path,
            log: Mutex::new(log),
        })
    }

    /// Location of this session's document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current in-memory log.
    pub async fn snapshot(&self) -> SessionLog {
        self.log.lock().await.clone()
    }

    /// Record a terminal job and flush the whole document to disk.
    ///
    /// The in-memory log is only updated once the write has been synced,
    /// so memory and disk never disagree after an error.
    pub async fn append(&self, job: Job) -> Result<(), StoreError> {
        let mut log = self.log.lock().await;

        let mut next = log.clone();
        let job_id = job.id();
        let status = job.status();
        next.push(job)?;

        let bytes = serde_json::to_vec_pretty(&next)?;
        write_atomic(&self.path, &bytes).await?;

        *log = next;
        tracing::debug!(
            %job_id,
            %status,
            total_count = log.total_count(),
            "Job recorded in session log",
        );
        Ok(())
    }
}

/// Read and validate a persisted session log.
///
/// Any parse failure (missing fields, malformed timestamps, unknown
/// statuses) or invariant violation is reported as
/// [`StoreError::CorruptLog`].
pub async fn load(path: impl AsRef<Path>) -> Result<SessionLog, StoreError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::io(path, e))?;

    let log: SessionLog = serde_json::from_str(&text).map_err(|e| StoreError::CorruptLog {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    log.validate().map_err(|e| StoreError::CorruptLog {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(log)
}

/// `session_<YYYYMMDD>_<HHMMSS>_<8 hex>.json`
fn session_file_name(log: &SessionLog) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{SESSION_FILE_PREFIX}{}_{}.{SESSION_FILE_EXTENSION}",
        log.session_start().format("%Y%m%d_%H%M%S"),
        &suffix[..8],
    )
}

/// Write `bytes` to a sibling temp file, fsync it, then rename it over
/// `path`. The parent directory is synced afterwards so the rename itself
/// survives a crash.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("json.tmp");

    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    drop(file);

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| StoreError::io(path, e))?;

    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        let dir = tokio::fs::File::open(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
        dir.sync_all()
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
