//! Content loader: pagination, block retrieval, memoization and lookups.
//!
//! Pagination within one listing is strictly sequential (each cursor comes
//! from the previous response). Transforms of independent pages run
//! concurrently and complete in no particular order.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument};

use super::extract::normalize_tag;
use super::transform::{self, page_discriminator, page_slug};
use crate::adapters::{RemoteStore, StatusFilter, StoreError};
use crate::domain::{Batch, Content, ContentType, RawBlock, RawPage};

/// Drain a cursor-paginated listing, one request at a time.
///
/// `fetch_page` receives the cursor of the previous response (`None` first)
/// and the loop ends when a response carries no continuation.
pub async fn collect_all<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, StoreError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Batch<T>, StoreError>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let batch = fetch_page(cursor.take()).await?;
        let next = batch.continuation().map(str::to_string);
        items.extend(batch.results);

        match next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(items)
}

/// Memoization for one pipeline run.
///
/// Holds the page listing and transformed content keyed by
/// `(page id, last-modified)`. Append-only until [`LoaderCache::clear`].
#[derive(Debug, Default)]
pub struct LoaderCache {
    pages: Mutex<Option<Vec<RawPage>>>,
    content: Mutex<HashMap<(String, String), Content>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LoaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the page listing and every transformed item
    pub fn clear(&self) {
        *lock(&self.pages) = None;
        lock(&self.content).clear();
    }

    /// Number of memoized content items
    pub fn len(&self) -> usize {
        lock(&self.content).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pages(&self) -> Option<Vec<RawPage>> {
        lock(&self.pages).clone()
    }

    fn store_pages(&self, pages: &[RawPage]) {
        *lock(&self.pages) = Some(pages.to_vec());
    }

    fn content(&self, page: &RawPage) -> Option<Content> {
        lock(&self.content).get(&Self::key(page)).cloned()
    }

    fn store_content(&self, page: &RawPage, content: &Content) {
        lock(&self.content).insert(Self::key(page), content.clone());
    }

    fn key(page: &RawPage) -> (String, String) {
        (page.id.clone(), page.last_edited_time.clone())
    }
}

/// Loader settings
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Database (collection) to query
    pub database_id: String,

    /// Lifecycle states considered visible
    pub filter: StatusFilter,

    /// Pages transformed concurrently
    pub concurrency: usize,

    /// Levels of nested children fetched below the top-level blocks
    pub block_depth: usize,
}

impl LoaderOptions {
    pub fn new(database_id: impl Into<String>, filter: StatusFilter) -> Self {
        Self {
            database_id: database_id.into(),
            filter,
            concurrency: 8,
            block_depth: 0,
        }
    }
}

/// Fetches, transforms and queries content from a [`RemoteStore`]
pub struct ContentLoader {
    store: Arc<dyn RemoteStore>,
    options: LoaderOptions,
    cache: Arc<LoaderCache>,
}

impl ContentLoader {
    pub fn new(store: Arc<dyn RemoteStore>, options: LoaderOptions) -> Self {
        Self::with_cache(store, options, Arc::new(LoaderCache::new()))
    }

    /// Loader sharing an existing memoization cache
    pub fn with_cache(
        store: Arc<dyn RemoteStore>,
        options: LoaderOptions,
        cache: Arc<LoaderCache>,
    ) -> Self {
        Self {
            store,
            options,
            cache,
        }
    }

    pub fn cache(&self) -> &LoaderCache {
        &self.cache
    }

    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Every visible page, memoized for the lifetime of the cache
    #[instrument(skip(self), fields(database_id = %self.options.database_id))]
    pub async fn fetch_all_pages(&self) -> Result<Vec<RawPage>, StoreError> {
        if let Some(pages) = self.cache.pages() {
            debug!(count = pages.len(), "Using memoized page listing");
            return Ok(pages);
        }

        let store = self.store.as_ref();
        let database_id = self.options.database_id.as_str();
        let filter = &self.options.filter;

        let pages = collect_all(|cursor| async move {
            store.query_pages(database_id, filter, cursor.as_deref()).await
        })
        .await?;

        info!(count = pages.len(), "Fetched page listing");
        self.cache.store_pages(&pages);
        Ok(pages)
    }

    /// All direct children of a page or block, in document order
    pub async fn fetch_page_blocks(&self, page_id: &str) -> Result<Vec<RawBlock>, StoreError> {
        let store = self.store.as_ref();

        let blocks = collect_all(|cursor| async move {
            store.block_children(page_id, cursor.as_deref()).await
        })
        .await?;

        debug!(page_id, count = blocks.len(), "Fetched blocks");
        Ok(blocks)
    }

    /// Top-level blocks plus nested children up to `block_depth` levels
    pub async fn fetch_block_tree(&self, page_id: &str) -> Result<Vec<RawBlock>, StoreError> {
        let blocks = self.fetch_page_blocks(page_id).await?;
        self.expand_children(blocks, self.options.block_depth).await
    }

    fn expand_children(
        &self,
        blocks: Vec<RawBlock>,
        depth: usize,
    ) -> BoxFuture<'_, Result<Vec<RawBlock>, StoreError>> {
        async move {
            if depth == 0 {
                return Ok(blocks);
            }

            let mut expanded = Vec::with_capacity(blocks.len());
            for mut block in blocks {
                if block.has_children && block.children.is_empty() && !block.id.is_empty() {
                    let children = self.fetch_page_blocks(&block.id).await?;
                    block.children = self.expand_children(children, depth - 1).await?;
                }
                expanded.push(block);
            }
            Ok(expanded)
        }
        .boxed()
    }

    /// Fetch blocks for `page` and transform it, reusing a memoized result
    /// when the page has not changed.
    pub async fn transform_page(&self, page: &RawPage) -> Result<Content, StoreError> {
        if let Some(content) = self.cache.content(page) {
            return Ok(content);
        }

        let blocks = self.fetch_block_tree(&page.id).await?;
        let content = transform::transform(page, blocks);
        self.cache.store_content(page, &content);
        Ok(content)
    }

    /// Every transformed item, optionally restricted to one content type.
    ///
    /// Result order is unspecified.
    pub async fn get_all(
        &self,
        content_type: Option<ContentType>,
    ) -> Result<Vec<Content>, StoreError> {
        let pages = self.fetch_all_pages().await?;

        let selected: Vec<&RawPage> = pages
            .iter()
            .filter(|page| match content_type {
                Some(wanted) => ContentType::from_discriminator(&page_discriminator(page)) == wanted,
                None => true,
            })
            .collect();

        stream::iter(selected.into_iter().map(|page| self.transform_page(page)))
            .buffer_unordered(self.options.concurrency.max(1))
            .try_collect()
            .await
    }

    /// The item whose raw slug equals `slug` exactly
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Content>, StoreError> {
        let pages = self.fetch_all_pages().await?;

        match pages.iter().find(|page| page_slug(page) == slug) {
            Some(page) => Ok(Some(self.transform_page(page).await?)),
            None => Ok(None),
        }
    }

    /// Items tagged with `tag` (case- and whitespace-insensitive)
    pub async fn get_by_project(&self, tag: &str) -> Result<Vec<Content>, StoreError> {
        let wanted = normalize_tag(tag);
        let all = self.get_all(None).await?;

        Ok(all
            .into_iter()
            .filter(|c| c.base.project.iter().any(|p| normalize_tag(p) == wanted))
            .collect())
    }

    /// Items in web category `name` (case-insensitive)
    pub async fn get_by_category(&self, name: &str) -> Result<Vec<Content>, StoreError> {
        let wanted = name.trim().to_lowercase();
        let all = self.get_all(None).await?;

        Ok(all
            .into_iter()
            .filter(|c| c.base.web_category.trim().to_lowercase() == wanted)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_all_follows_cursors_in_order() {
        let pages = vec![
            Batch::more(vec![1, 2, 3], "c1"),
            Batch::more(vec![4, 5, 6], "c2"),
            Batch::last(vec![7]),
        ];
        let seen = Mutex::new(Vec::new());

        let items = collect_all(|cursor| {
            let idx = match cursor.as_deref() {
                None => 0,
                Some("c1") => 1,
                Some(_) => 2,
            };
            seen.lock().unwrap().push(cursor);
            let batch = pages[idx].clone();
            async move { Ok(batch) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_collect_all_propagates_errors() {
        let result: Result<Vec<u8>, _> = collect_all(|cursor| async move {
            match cursor {
                None => Ok(Batch::more(vec![1], "next")),
                Some(_) => Err(StoreError::Api {
                    status: 502,
                    message: "bad gateway".to_string(),
                }),
            }
        })
        .await;

        assert!(matches!(result, Err(StoreError::Api { status: 502, .. })));
    }

    #[test]
    fn test_cache_clear() {
        let cache = LoaderCache::new();
        let page = RawPage {
            id: "p".to_string(),
            last_edited_time: "t1".to_string(),
            properties: Default::default(),
        };
        cache.store_pages(std::slice::from_ref(&page));
        cache.store_content(&page, &transform::transform(&page, vec![]));
        assert_eq!(cache.len(), 1);

        let edited = RawPage {
            last_edited_time: "t2".to_string(),
            ..page.clone()
        };
        assert!(cache.content(&edited).is_none());

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.pages().is_none());
    }
}
