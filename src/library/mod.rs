//! Durable local artifacts produced by a sync.
//!
//! - `assets`: content-addressed media cache that makes remote URLs permanent
//! - `backup`: aggregate, per-item and metadata JSON documents
//!
//! # Storage Layout
//!
//! ```text
//! <output>/
//! ├── content.json
//! ├── metadata.json
//! ├── articles/ comics/ podcasts/
//! └── media/                # <stable-id or sha256(url)[0:16]>.<ext>
//! ```

pub mod assets;
pub mod backup;

pub use assets::{asset_filename, AssetCache, AssetError, AssetStats};
pub use backup::{BackupReport, BackupWriter, Metadata, SlugCollision};
