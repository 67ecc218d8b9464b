use std::path::PathBuf;

use scriptrelay_core::session::SessionLogError;

/// Errors from the session log store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading, writing, syncing or renaming a session file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory log could not be encoded.
    #[error("Failed to serialize session log: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A persisted document is not a well-formed session log.
    #[error("Corrupt session log {}: {reason}", path.display())]
    CorruptLog { path: PathBuf, reason: String },

    /// The job cannot be recorded (not terminal, or already recorded).
    #[error("Rejected job record: {0}")]
    Rejected(#[from] SessionLogError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
