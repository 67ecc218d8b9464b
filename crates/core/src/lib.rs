//! Domain model for remote script execution sessions.
//!
//! Pure types and lifecycle rules with no I/O: [`job::Job`] and its
//! state machine, [`session::SessionLog`], and submission validation.

pub mod error;
pub mod job;
pub mod session;
pub mod types;
pub mod validation;
