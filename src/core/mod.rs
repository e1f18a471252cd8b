//! Core orchestration logic.
//!
//! This module contains:
//! - Orchestrator: one sync run from remote store to backup files

pub mod orchestrator;

// Re-export commonly used types
pub use orchestrator::{sort_for_publishing, Orchestrator, PublishSettings, SyncOptions, SyncReport};
