//! Shared in-memory doubles for the remote store and media downloads.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use content_mirror::adapters::{AssetFetcher, FetchError, RemoteStore, StatusFilter, StoreError};
use content_mirror::domain::{Batch, RawBlock, RawPage};
use serde_json::{json, Map, Value};

/// Split `items` into batches of the given sizes, chained by cursors "1", "2", ...
fn paginate<T: Clone>(items: &[T], sizes: &[usize]) -> Vec<Batch<T>> {
    let mut batches = Vec::new();
    let mut offset = 0;
    for (idx, size) in sizes.iter().enumerate() {
        let chunk = items[offset..offset + size].to_vec();
        offset += size;
        if idx + 1 == sizes.len() {
            batches.push(Batch::last(chunk));
        } else {
            batches.push(Batch::more(chunk, (idx + 1).to_string()));
        }
    }
    batches
}

fn batch_at<T: Clone>(batches: &[Batch<T>], cursor: Option<&str>) -> Batch<T> {
    let idx = cursor.and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
    batches[idx].clone()
}

/// Remote store backed by fixed batches
#[derive(Default)]
pub struct MockStore {
    page_batches: Vec<Batch<RawPage>>,
    block_batches: HashMap<String, Vec<Batch<RawBlock>>>,
    failing_blocks: HashSet<String>,
    failing_status: HashSet<String>,
    pub query_cursors: Mutex<Vec<Option<String>>>,
    pub block_requests: Mutex<Vec<(String, Option<String>)>>,
    pub status_updates: Mutex<Vec<(String, String, String)>>,
    pub filters_seen: Mutex<Vec<StatusFilter>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages delivered in one batch
    pub fn with_pages(self, pages: Vec<RawPage>) -> Self {
        let n = pages.len();
        self.with_paged_pages(pages, &[n])
    }

    pub fn with_paged_pages(mut self, pages: Vec<RawPage>, sizes: &[usize]) -> Self {
        self.page_batches = paginate(&pages, sizes);
        self
    }

    pub fn with_blocks(self, parent: &str, blocks: Vec<RawBlock>) -> Self {
        let n = blocks.len();
        self.with_paged_blocks(parent, blocks, &[n])
    }

    pub fn with_paged_blocks(mut self, parent: &str, blocks: Vec<RawBlock>, sizes: &[usize]) -> Self {
        self.block_batches
            .insert(parent.to_string(), paginate(&blocks, sizes));
        self
    }

    pub fn failing_blocks_for(mut self, parent: &str) -> Self {
        self.failing_blocks.insert(parent.to_string());
        self
    }

    pub fn failing_status_for(mut self, page_id: &str) -> Self {
        self.failing_status.insert(page_id.to_string());
        self
    }

    pub fn query_count(&self) -> usize {
        self.query_cursors.lock().unwrap().len()
    }

    pub fn block_request_count(&self, parent: &str) -> usize {
        self.block_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == parent)
            .count()
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    async fn query_pages(
        &self,
        _database_id: &str,
        filter: &StatusFilter,
        cursor: Option<&str>,
    ) -> Result<Batch<RawPage>, StoreError> {
        self.query_cursors
            .lock()
            .unwrap()
            .push(cursor.map(str::to_string));
        self.filters_seen.lock().unwrap().push(filter.clone());

        if self.page_batches.is_empty() {
            return Ok(Batch::last(Vec::new()));
        }
        Ok(batch_at(&self.page_batches, cursor))
    }

    async fn block_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<Batch<RawBlock>, StoreError> {
        self.block_requests
            .lock()
            .unwrap()
            .push((block_id.to_string(), cursor.map(str::to_string)));

        if self.failing_blocks.contains(block_id) {
            return Err(StoreError::Api {
                status: 500,
                message: "internal error".to_string(),
            });
        }

        match self.block_batches.get(block_id) {
            Some(batches) => Ok(batch_at(batches, cursor)),
            None => Ok(Batch::last(Vec::new())),
        }
    }

    async fn update_status(
        &self,
        page_id: &str,
        property: &str,
        state: &str,
    ) -> Result<(), StoreError> {
        if self.failing_status.contains(page_id) {
            return Err(StoreError::Api {
                status: 409,
                message: "conflict".to_string(),
            });
        }
        self.status_updates.lock().unwrap().push((
            page_id.to_string(),
            property.to_string(),
            state.to_string(),
        ));
        Ok(())
    }
}

/// Downloader that serves fixed bytes and counts requests per URL
#[derive(Default)]
pub struct MockFetcher {
    failing: HashSet<String>,
    pub requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn total(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

#[async_trait]
impl AssetFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 403,
            });
        }
        Ok(format!("bytes of {}", url).into_bytes())
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn page(id: &str, props: Value) -> RawPage {
    let properties: Map<String, Value> = props.as_object().cloned().unwrap_or_default();
    RawPage {
        id: id.to_string(),
        last_edited_time: "2024-01-01T00:00:00.000Z".to_string(),
        properties,
    }
}

/// Page with the common publishing properties set
pub fn typed_page(id: &str, content_type: &str, slug: &str) -> RawPage {
    page(
        id,
        json!({
            "Title": { "title": [{ "plain_text": format!("Title of {}", slug) }] },
            "Slug": { "rich_text": [{ "plain_text": slug }] },
            "Content Type": { "select": { "name": content_type } },
            "Status": { "status": { "name": "Ready to Publish" } }
        }),
    )
}

pub fn para(text: &str) -> RawBlock {
    RawBlock::new("paragraph", json!({ "rich_text": [{ "plain_text": text }] }))
}

pub fn image(id: &str, url: &str) -> RawBlock {
    RawBlock::new(
        "image",
        json!({ "type": "file", "file": { "url": url }, "caption": [] }),
    )
    .with_id(id)
}
