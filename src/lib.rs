//! content-mirror - Mirror a remote page/block store into local content
//!
//! Fetches pages and their block trees from a paginated remote store,
//! transforms them into a typed content model (article, comic, podcast),
//! and persists the result so downstream builds never depend on the
//! remote store's availability or its expiring media URLs.
//!
//! # Architecture
//!
//! ```text
//! RemoteStore → ContentLoader → transform → AssetCache → BackupWriter
//! ```
//!
//! - Pagination is sequential per listing; page transforms run concurrently
//! - Media is cached by stable id or SHA256(url), idempotently
//! - A failed download keeps the remote URL; a failed listing aborts the run
//!
//! # Modules
//!
//! - `adapters`: Remote store and media download interfaces (Notion, HTTP)
//! - `core`: Sync orchestration
//! - `domain`: Raw records, content model, schema
//! - `ingest`: Extractors, transformer, loader
//! - `library`: Asset cache and backup writer
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Mirror everything and mark pages published
//! NOTION_TOKEN=... cmirror sync --mark-published
//!
//! # Look up one item
//! cmirror show my-first-comic
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod library;

// Re-export main types at crate root for convenience
pub use adapters::{AssetFetcher, RemoteStore, StatusFilter, StoreError};
pub use crate::core::{Orchestrator, SyncOptions, SyncReport};
pub use domain::{Content, ContentBody, ContentType, RawBlock, RawPage};
pub use ingest::{ContentLoader, LoaderCache, LoaderOptions};
pub use library::{AssetCache, BackupWriter};
