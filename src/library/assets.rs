//! Content-addressed media cache.
//!
//! Remote media URLs expire; this cache downloads each one once into a flat
//! media directory and hands back a stable local path. Lookups go
//! in-memory map → file on disk → download. A failed download is not fatal:
//! the caller keeps the original URL.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::adapters::{AssetFetcher, FetchError};
use crate::domain::{Content, ContentBody, RawBlock};

/// Extension used when none can be sniffed from the URL
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Extensions accepted from a URL path suffix
const KNOWN_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "avif", "svg", "mp3", "m4a", "wav", "ogg", "mp4",
    "mov", "webm", "pdf",
];

/// Block types whose payload is a hosted file
const MEDIA_BLOCK_TYPES: &[&str] = &["image", "audio", "video", "file"];

/// Errors from a single cache fill
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Download failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters for observability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssetStats {
    /// Distinct URLs resolved to a local path
    pub entries: usize,
    /// Downloads performed
    pub downloads: usize,
    /// Downloads that failed
    pub failures: usize,
}

/// Best-effort extension from the URL's path suffix
pub fn sniff_extension(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let last = path.rsplit('/').next().unwrap_or_default();

    last.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .and_then(|ext| KNOWN_EXTENSIONS.iter().find(|known| **known == ext).copied())
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Cached file name for `url`.
///
/// Uses the stable identifier when given (so URL rotation does not change the
/// name), otherwise the first 16 hex chars of SHA256(url).
pub fn asset_filename(url: &str, stable_id: Option<&str>) -> String {
    let stem = match stable_id.map(sanitize).filter(|s| !s.is_empty()) {
        Some(id) => id,
        None => {
            let digest = Sha256::digest(url.as_bytes());
            hex::encode(&digest[..8])
        }
    };

    format!("{}.{}", stem, sniff_extension(url))
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Idempotent URL → local path cache backed by a media directory
pub struct AssetCache {
    /// Directory holding cached files
    media_dir: PathBuf,

    /// Public path prefix of cached files (e.g. `/media`)
    public_prefix: String,

    fetcher: Arc<dyn AssetFetcher>,

    /// url → local path, filled at most once per URL
    entries: Mutex<HashMap<String, Arc<OnceCell<String>>>>,

    downloads: AtomicUsize,
    failures: AtomicUsize,

    /// Downloads in flight at once
    concurrency: usize,
}

impl AssetCache {
    pub fn new(
        media_dir: impl Into<PathBuf>,
        public_prefix: impl Into<String>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Self {
        let public_prefix: String = public_prefix.into();
        Self {
            media_dir: media_dir.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
            fetcher,
            entries: Mutex::new(HashMap::new()),
            downloads: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            concurrency: 4,
        }
    }

    /// Set how many downloads may run at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Number of distinct cached entries
    pub fn len(&self) -> usize {
        lock(&self.entries)
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> AssetStats {
        AssetStats {
            entries: self.len(),
            downloads: self.downloads.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Whether `url` already points into the media directory
    pub fn is_local(&self, url: &str) -> bool {
        url.starts_with(&format!("{}/", self.public_prefix))
    }

    fn public_path(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix, filename)
    }

    /// Make `url` permanent.
    ///
    /// Returns the input unchanged for empty or already-local URLs, the local
    /// path once cached, or `None` when the download failed.
    ///
    /// The first successful registration of a URL wins: later calls return
    /// that path whatever `stable_id` they pass. Concurrent callers for the
    /// same URL share one fill, so a URL is downloaded at most once.
    pub async fn cache_image(&self, url: &str, stable_id: Option<&str>) -> Option<String> {
        if url.is_empty() || self.is_local(url) {
            return Some(url.to_string());
        }

        let slot = self.slot(url);
        match slot.get_or_try_init(|| self.fill(url, stable_id)).await {
            Ok(local) => Some(local.clone()),
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(url, error = %e, "Failed to cache asset, keeping remote URL");
                None
            }
        }
    }

    /// Like [`cache_image`](Self::cache_image) but falls back to the original URL
    pub async fn resolve(&self, url: &str, stable_id: Option<&str>) -> String {
        self.cache_image(url, stable_id)
            .await
            .unwrap_or_else(|| url.to_string())
    }

    /// Shared fill cell for `url`, created on first use
    fn slot(&self, url: &str) -> Arc<OnceCell<String>> {
        lock(&self.entries)
            .entry(url.to_string())
            .or_default()
            .clone()
    }

    /// Resolve `url` to a local path, reusing a file already on disk
    async fn fill(&self, url: &str, stable_id: Option<&str>) -> Result<String, AssetError> {
        let filename = asset_filename(url, stable_id);
        let target = self.media_dir.join(&filename);
        let local = self.public_path(&filename);

        if fs::try_exists(&target).await.unwrap_or(false) {
            debug!(url, path = %target.display(), "Asset already on disk");
            return Ok(local);
        }

        self.download(url, &target).await?;
        debug!(url, path = %target.display(), "Cached asset");
        Ok(local)
    }

    async fn download(&self, url: &str, target: &Path) -> Result<(), AssetError> {
        self.downloads.fetch_add(1, Ordering::Relaxed);
        let bytes = self.fetcher.fetch(url).await?;

        fs::create_dir_all(&self.media_dir).await?;

        // Write-then-rename so a partial file never passes the existence check
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let partial = self
            .media_dir
            .join(format!(".{}.{}.part", file_name, Uuid::new_v4().simple()));
        fs::write(&partial, &bytes).await?;
        fs::rename(&partial, target).await?;

        Ok(())
    }

    /// Cache every media reference in a block tree.
    ///
    /// Returns a rewritten copy; `blocks` is left untouched. Each distinct URL
    /// is cached once, with downloads running concurrently.
    pub async fn cache_block_images(&self, blocks: &[RawBlock]) -> Vec<RawBlock> {
        let mut refs = Vec::new();
        collect_media(blocks, &mut refs);

        let mut seen = HashSet::new();
        refs.retain(|(url, _)| seen.insert(url.clone()));

        let resolved: HashMap<String, String> = stream::iter(refs)
            .map(|(url, stable_id)| async move {
                let local = self.cache_image(&url, stable_id.as_deref()).await;
                local.map(|local| (url, local))
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|entry| async move { entry })
            .collect()
            .await;

        rewrite_tree(blocks, &resolved)
    }

    /// Cache the hero image, block media and variant attachments of `content`
    pub async fn cache_content(&self, mut content: Content) -> Content {
        let id = content.base.id.clone();

        if let Some(hero) = content.base.hero_image.take() {
            let stable = format!("{}-hero", id);
            content.base.hero_image = Some(self.resolve(&hero, Some(&stable)).await);
        }

        content.base.blocks = self.cache_block_images(&content.base.blocks).await;

        match &mut content.body {
            ContentBody::Comic(comic) => {
                for panel in &mut comic.panels {
                    let stable = format!("{}-panel-{}", id, panel.panel_number);
                    panel.image_url = self.resolve(&panel.image_url, Some(&stable)).await;
                }
            }
            ContentBody::Podcast(podcast) => {
                if let Some(url) = podcast.audio_file.url.take() {
                    let stable = format!("{}-audio", id);
                    podcast.audio_file.url = Some(self.resolve(&url, Some(&stable)).await);
                }
            }
            ContentBody::Article(_) => {}
        }

        content
    }
}

/// Stable identifier for a media block
fn block_stable_id(block: &RawBlock) -> Option<String> {
    if block.id.is_empty() {
        None
    } else {
        Some(format!("block-{}", block.id))
    }
}

fn is_media(block: &RawBlock) -> bool {
    MEDIA_BLOCK_TYPES.contains(&block.kind.as_str())
}

/// Collect `(url, stable id)` for every media block, depth first
fn collect_media(blocks: &[RawBlock], out: &mut Vec<(String, Option<String>)>) {
    for block in blocks {
        if is_media(block) {
            // Empty references stay exactly as delivered
            if let Some(url) = block.media_url().filter(|url| !url.is_empty()) {
                out.push((url.to_string(), block_stable_id(block)));
            }
        }
        // Declared children are walked whatever `has_children` says
        collect_media(&block.children, out);
    }
}

fn rewrite_tree(blocks: &[RawBlock], resolved: &HashMap<String, String>) -> Vec<RawBlock> {
    blocks
        .iter()
        .map(|block| {
            let mut copy = block.clone();
            if is_media(block) {
                if let Some(local) = block.media_url().and_then(|url| resolved.get(url)) {
                    point_at_local(&mut copy, local);
                }
            }
            copy.children = rewrite_tree(&block.children, resolved);
            copy
        })
        .collect()
}

/// Normalize a media payload to the externally-hosted shape at `local`
fn point_at_local(block: &mut RawBlock, local: &str) {
    if let Some(Value::Object(payload)) = block.payload_mut() {
        payload.remove("file");
        payload.insert("type".to_string(), json!("external"));
        payload.insert("external".to_string(), json!({ "url": local }));
    }
}
