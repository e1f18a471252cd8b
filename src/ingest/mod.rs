//! Ingestion pipeline from the remote store into typed content.
//!
//! 1. **Extract**: total functions over raw property shapes
//! 2. **Transform**: raw page + blocks → one typed content variant
//! 3. **Loader**: cursor pagination, block retrieval, memoization, lookups
//!
//! # Architecture
//!
//! ```text
//! RemoteStore → Loader (pages, blocks) → Transform → Content
//!                  ↑                          ↓
//!             LoaderCache  ←──────────── memoized by (id, last_edited)
//! ```

pub mod extract;
pub mod loader;
pub mod transform;

// Re-export key types
pub use loader::{collect_all, ContentLoader, LoaderCache, LoaderOptions};
pub use transform::{transform, transform_at};
