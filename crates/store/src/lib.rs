//! Durable session log storage.
//!
//! Each session is one pretty-printed JSON document on disk. The
//! [`SessionStore`] handle owns the in-memory [`SessionLog`] for the
//! running session and rewrites the document atomically on every
//! [`append`](SessionStore::append). [`load`] and [`list_sessions`] read
//! documents written by earlier sessions.

pub mod error;
pub mod listing;
pub mod store;

pub use error::StoreError;
pub use listing::{list_sessions, SessionListing, SessionSummary};
pub use store::{load, SessionStore};
