//! planit library
//!
//! This module exports the task model, the file-backed store and the CLI
//! plumbing for testing and integration.

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod store;
pub mod types;
