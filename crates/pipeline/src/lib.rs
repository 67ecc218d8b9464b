//! Composite (multi-step) runs on top of the script client.
//!
//! A composite run submits its steps strictly in order and stops at the
//! first failure, reporting what succeeded, where it stopped and how many
//! steps were never submitted.

pub mod error;
pub mod orchestrator;

pub use error::PipelineError;
pub use orchestrator::{CompositeResult, CompositeStep, SessionOrchestrator};
