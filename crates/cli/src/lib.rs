//! Command-line front end: interactive menu, one-shot composite runs and
//! session log inspection.

pub mod app;
pub mod cli;
pub mod config;
pub mod menu;
pub mod report;
pub mod steps;
