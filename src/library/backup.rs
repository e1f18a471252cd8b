//! Durable backup of a synced content collection.
//!
//! # Layout
//!
//! ```text
//! <output>/
//! ├── content.json          # Aggregate: version, generatedAt, runId, count, items
//! ├── metadata.json         # Counts, taxonomies, date range, index, readiness
//! ├── articles/<slug>.json  # One document per item, grouped by type
//! ├── comics/<slug>.json
//! ├── podcasts/<slug>.json
//! └── media/                # Written by the asset cache
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Content, ContentType, SCHEMA_VERSION};

/// Aggregate document file name
pub const AGGREGATE_FILE: &str = "content.json";

/// Metadata document file name
pub const METADATA_FILE: &str = "metadata.json";

/// Aggregate document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate<'a> {
    pub version: &'static str,
    pub generated_at: DateTime<Utc>,
    pub run_id: Uuid,
    pub count: usize,
    pub items: &'a [Content],
}

/// Compact per-item index entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub slug: String,
    pub title: String,
    pub content_type: ContentType,
    pub date: String,
    pub sd_index: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

/// Readiness counters for downstream AI tooling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgiReadiness {
    pub with_embedding: usize,
    pub with_dialogue: usize,
    pub with_philosophical_insight: usize,
    pub total_blocks: usize,
}

/// Summary document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub version: &'static str,
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub counts: BTreeMap<ContentType, usize>,
    pub categories: BTreeSet<String>,
    pub projects: BTreeSet<String>,
    pub concepts: BTreeSet<String>,
    pub date_range: DateRange,
    pub index: Vec<IndexEntry>,
    pub agi_readiness: AgiReadiness,
}

impl Metadata {
    /// Summarize a collection
    pub fn summarize(items: &[Content], generated_at: DateTime<Utc>) -> Self {
        let mut counts: BTreeMap<ContentType, usize> =
            ContentType::ALL.iter().map(|t| (*t, 0)).collect();
        let mut categories = BTreeSet::new();
        let mut projects = BTreeSet::new();
        let mut concepts = BTreeSet::new();
        let mut readiness = AgiReadiness::default();

        for item in items {
            *counts.entry(item.content_type()).or_default() += 1;

            let base = &item.base;
            if !base.web_category.is_empty() {
                categories.insert(base.web_category.clone());
            }
            projects.extend(base.project.iter().cloned());
            concepts.extend(base.concepts.iter().cloned());

            if base.embedding.is_some() {
                readiness.with_embedding += 1;
            }
            if !base.dialogue.is_empty() {
                readiness.with_dialogue += 1;
            }
            if base.philosophical_insight.as_deref().is_some_and(|s| !s.is_empty()) {
                readiness.with_philosophical_insight += 1;
            }
            readiness.total_blocks += base.blocks.len();
        }

        let dates = items
            .iter()
            .map(|i| i.base.date.as_str())
            .filter(|d| !d.is_empty());

        let date_range = DateRange {
            earliest: dates.clone().min().map(str::to_string),
            latest: dates.max().map(str::to_string),
        };

        let index = items
            .iter()
            .map(|i| IndexEntry {
                slug: i.base.slug.clone(),
                title: i.base.title.clone(),
                content_type: i.content_type(),
                date: i.base.date.clone(),
                sd_index: i.base.sd_index,
            })
            .collect();

        Self {
            version: SCHEMA_VERSION,
            generated_at,
            total: items.len(),
            counts,
            categories,
            projects,
            concepts,
            date_range,
            index,
            agi_readiness: readiness,
        }
    }
}

/// A slug that was already taken within its type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugCollision {
    pub content_type: ContentType,
    pub slug: String,
    /// File name actually written
    pub written_as: String,
}

/// What a backup wrote
#[derive(Debug, Clone, Default)]
pub struct BackupReport {
    pub aggregate: PathBuf,
    pub metadata: PathBuf,
    pub items: Vec<PathBuf>,
    pub collisions: Vec<SlugCollision>,
}

/// File-name-safe form of a slug
pub fn file_stem(slug: &str) -> String {
    slug.trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Assigns unique file stems per content type, suffixing `-2`, `-3`, ...
#[derive(Debug, Default)]
pub struct SlugAllocator {
    taken: HashSet<(ContentType, String)>,
}

impl SlugAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unique stem for `stem`, and whether a suffix had to be added
    pub fn allocate(&mut self, content_type: ContentType, stem: &str) -> (String, bool) {
        if self.taken.insert((content_type, stem.to_string())) {
            return (stem.to_string(), false);
        }

        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", stem, n);
            if self.taken.insert((content_type, candidate.clone())) {
                return (candidate, true);
            }
            n += 1;
        }
    }
}

/// Writes backup documents under an output directory
pub struct BackupWriter {
    root: PathBuf,
}

impl BackupWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn type_dir(&self, content_type: ContentType) -> PathBuf {
        self.root.join(content_type.plural())
    }

    async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(value)?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write backup file: {}", path.display()))?;

        Ok(())
    }

    /// Write the aggregate, per-item and metadata documents for `items`
    pub async fn write(&self, items: &[Content], run_id: Uuid) -> Result<BackupReport> {
        let generated_at = Utc::now();
        let mut report = BackupReport {
            aggregate: self.root.join(AGGREGATE_FILE),
            metadata: self.root.join(METADATA_FILE),
            ..Default::default()
        };

        let aggregate = Aggregate {
            version: SCHEMA_VERSION,
            generated_at,
            run_id,
            count: items.len(),
            items,
        };
        Self::write_json(&report.aggregate, &aggregate).await?;

        let mut slugs = SlugAllocator::new();
        for item in items {
            let content_type = item.content_type();
            let mut stem = file_stem(&item.base.slug);
            if stem.is_empty() {
                stem = file_stem(&item.base.id);
            }

            let (name, collided) = slugs.allocate(content_type, &stem);
            if collided {
                warn!(
                    content_type = %content_type,
                    slug = %item.base.slug,
                    written_as = %name,
                    "Duplicate slug, writing with suffix"
                );
                report.collisions.push(SlugCollision {
                    content_type,
                    slug: item.base.slug.clone(),
                    written_as: name.clone(),
                });
            }

            let path = self.type_dir(content_type).join(format!("{}.json", name));
            Self::write_json(&path, item).await?;
            report.items.push(path);
        }

        let metadata = Metadata::summarize(items, generated_at);
        Self::write_json(&report.metadata, &metadata).await?;

        info!(
            items = report.items.len(),
            collisions = report.collisions.len(),
            root = %self.root.display(),
            "Backup written"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Night Walk/Part 1"), "night-walk-part-1");
        assert_eq!(file_stem("ep_1"), "ep_1");
        assert_eq!(file_stem("  "), "");
    }

    #[test]
    fn test_allocator_suffixes_per_type() {
        let mut slugs = SlugAllocator::new();
        assert_eq!(slugs.allocate(ContentType::Comic, "ep1"), ("ep1".to_string(), false));
        assert_eq!(slugs.allocate(ContentType::Comic, "ep1"), ("ep1-2".to_string(), true));
        assert_eq!(slugs.allocate(ContentType::Comic, "ep1"), ("ep1-3".to_string(), true));
        // Different namespace, no collision
        assert_eq!(slugs.allocate(ContentType::Article, "ep1"), ("ep1".to_string(), false));
    }

    #[test]
    fn test_allocator_skips_taken_suffix() {
        let mut slugs = SlugAllocator::new();
        slugs.allocate(ContentType::Article, "a-2");
        slugs.allocate(ContentType::Article, "a");
        assert_eq!(slugs.allocate(ContentType::Article, "a"), ("a-3".to_string(), true));
    }
}
