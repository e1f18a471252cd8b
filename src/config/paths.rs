//! Canonical output paths for a sync.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use content_mirror::config::paths;
//!
//! let aggregate = paths::aggregate_file()?;
//! let media = paths::media_dir()?;
//! ```

use std::path::PathBuf;

use anyhow::Result;

use crate::domain::ContentType;
use crate::library::backup::{AGGREGATE_FILE, METADATA_FILE};

/// Backup output directory
pub fn output_dir() -> Result<PathBuf> {
    Ok(crate::config::config()?.output.clone())
}

/// Aggregate document (<output>/content.json)
pub fn aggregate_file() -> Result<PathBuf> {
    Ok(output_dir()?.join(AGGREGATE_FILE))
}

/// Metadata document (<output>/metadata.json)
pub fn metadata_file() -> Result<PathBuf> {
    Ok(output_dir()?.join(METADATA_FILE))
}

/// Per-type item directory (<output>/<type plural>/)
pub fn content_type_dir(content_type: ContentType) -> Result<PathBuf> {
    Ok(output_dir()?.join(content_type.plural()))
}

/// Cached media directory
pub fn media_dir() -> Result<PathBuf> {
    Ok(crate::config::config()?.media.clone())
}
