//! Main orchestrator for a sync run.
//!
//! Coordinates loading, asset caching, backup writing and the post-publish
//! status update. Page or block listing failures abort the run; asset and
//! status failures are logged and the run continues.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{AssetFetcher, HttpFetcher, NotionClient, RemoteStore};
use crate::adapters::notion::NotionConfig;
use crate::config::ResolvedConfig;
use crate::domain::{Content, ContentType, RawPage};
use crate::ingest::extract;
use crate::ingest::{ContentLoader, LoaderOptions};
use crate::library::{AssetCache, AssetStats, BackupWriter, SlugCollision};

/// Per-run switches
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Download media and rewrite references to local paths
    pub cache_assets: bool,

    /// Move synced pages to the published state once the backup is written
    pub mark_published: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            cache_assets: true,
            mark_published: false,
        }
    }
}

/// Where the post-publish status lives and what it becomes
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub status_property: String,
    pub published_state: String,
}

/// Outcome of one sync run
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub total: usize,
    pub counts: BTreeMap<ContentType, usize>,
    pub assets: AssetStats,
    pub collisions: Vec<SlugCollision>,
    pub status_updated: usize,
    pub status_failures: usize,
    pub output: PathBuf,
}

/// Main sync orchestrator
pub struct Orchestrator {
    loader: ContentLoader,
    assets: AssetCache,
    backup: BackupWriter,
    publish: PublishSettings,
    concurrency: usize,
}

impl Orchestrator {
    /// Create an orchestrator from its parts
    pub fn new(
        loader: ContentLoader,
        assets: AssetCache,
        backup: BackupWriter,
        publish: PublishSettings,
    ) -> Self {
        let concurrency = loader.options().concurrency.max(1);
        Self {
            loader,
            assets,
            backup,
            publish,
            concurrency,
        }
    }

    /// Wire the Notion client, HTTP downloader and output paths from config
    pub fn from_config(config: &ResolvedConfig, token: String) -> Result<Self> {
        let store: Arc<dyn RemoteStore> = Arc::new(NotionClient::from_config(NotionConfig {
            token,
            base_url: config.remote.base_url.clone(),
            api_version: config.remote.api_version.clone(),
        }));
        let fetcher: Arc<dyn AssetFetcher> = Arc::new(HttpFetcher::new());

        let mut options = LoaderOptions::new(config.database_id()?, config.remote.status_filter());
        options.concurrency = config.sync.concurrency;
        options.block_depth = config.sync.block_depth;

        Ok(Self::new(
            ContentLoader::new(store, options),
            AssetCache::new(&config.media, &config.sync.media_prefix, fetcher)
                .with_concurrency(config.sync.concurrency),
            BackupWriter::new(&config.output),
            PublishSettings {
                status_property: config.remote.status_property.clone(),
                published_state: config.remote.published_state.clone(),
            },
        ))
    }

    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    /// Execute one sync run
    #[instrument(skip(self))]
    pub async fn run_sync(&self, options: SyncOptions) -> Result<SyncReport> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "Starting sync");

        let mut items = self
            .loader
            .get_all(None)
            .await
            .context("Failed to load content from remote store")?;

        info!(count = items.len(), "Content transformed");

        if options.cache_assets {
            items = stream::iter(items)
                .map(|content| self.assets.cache_content(content))
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        }

        sort_for_publishing(&mut items);

        let backup = self.backup.write(&items, run_id).await?;

        let (status_updated, status_failures) = if options.mark_published {
            let pages = self.loader.fetch_all_pages().await?;
            self.mark_published(&pages).await
        } else {
            (0, 0)
        };

        let mut counts: BTreeMap<ContentType, usize> = BTreeMap::new();
        for item in &items {
            *counts.entry(item.content_type()).or_default() += 1;
        }

        let report = SyncReport {
            run_id,
            total: items.len(),
            counts,
            assets: self.assets.stats(),
            collisions: backup.collisions,
            status_updated,
            status_failures,
            output: self.backup.root().to_path_buf(),
        };

        info!(
            %run_id,
            total = report.total,
            assets = report.assets.entries,
            asset_failures = report.assets.failures,
            "Sync complete"
        );

        Ok(report)
    }

    /// Move every page not yet in the published state. Never fails the run.
    async fn mark_published(&self, pages: &[RawPage]) -> (usize, usize) {
        let property = self.publish.status_property.as_str();
        let target = self.publish.published_state.as_str();
        let mut updated = 0;
        let mut failed = 0;

        for page in pages {
            let current = extract::select(page.property(property));
            if current == target {
                continue;
            }

            match self.loader.store().update_status(&page.id, property, target).await {
                Ok(()) => {
                    info!(page_id = %page.id, from = %current, to = target, "Status updated");
                    updated += 1;
                }
                Err(e) => {
                    warn!(page_id = %page.id, error = %e, "Status update failed (non-critical)");
                    failed += 1;
                }
            }
        }

        (updated, failed)
    }
}

/// Newest first; undated items last; ties broken by slug
pub fn sort_for_publishing(items: &mut [Content]) {
    items.sort_by(|a, b| {
        b.base
            .date
            .cmp(&a.base.date)
            .then_with(|| a.base.slug.cmp(&b.base.slug))
    });
}
