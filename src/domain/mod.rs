//! Domain types for the content mirror.
//!
//! This module contains the core data structures:
//! - Raw: Pages and blocks as delivered by the remote store
//! - Content: The typed, transformed content model
//! - Schema: The JSON schema document describing the content model

pub mod content;
pub mod raw;
pub mod schema;

// Re-export commonly used types
pub use content::{
    Article, AudioFile, Comic, Content, ContentBase, ContentBody, ContentType, Coordinates,
    Location, Panel, Podcast, PodcastStructure, SensoryMemory, DEFAULT_LANGUAGE, SCHEMA_VERSION,
};
pub use raw::{Batch, RawBlock, RawPage};
pub use schema::content_schema;
