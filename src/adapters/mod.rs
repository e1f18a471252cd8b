//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the remote content store and for
//! downloading media. Business logic depends on these traits, never on HTTP.

pub mod http;
pub mod notion;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::{Batch, RawBlock, RawPage};

pub use http::HttpFetcher;
pub use notion::NotionClient;

/// Errors from the remote content store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors from a single media download
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download of {url} failed with status {status}")]
    Status { url: String, status: u16 },
}

/// Lifecycle states that make a page visible for publishing
///
/// Matches pages whose status property equals any of `states`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    /// Name of the status property
    pub property: String,

    /// Accepted state names (logical OR)
    pub states: Vec<String>,
}

impl StatusFilter {
    pub fn new(property: impl Into<String>, states: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            property: property.into(),
            states: states.into_iter().map(Into::into).collect(),
        }
    }

    /// Query filter body understood by the remote store
    pub fn to_query(&self) -> Value {
        let clauses: Vec<Value> = self
            .states
            .iter()
            .map(|state| json!({ "property": self.property, "status": { "equals": state } }))
            .collect();

        json!({ "or": clauses })
    }
}

/// The ability to read (and mark) pages in the remote store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// One page of database rows matching `filter`, starting at `cursor`
    async fn query_pages(
        &self,
        database_id: &str,
        filter: &StatusFilter,
        cursor: Option<&str>,
    ) -> Result<Batch<RawPage>, StoreError>;

    /// One page of the direct children of a page or block
    async fn block_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<Batch<RawBlock>, StoreError>;

    /// Move a page to the named lifecycle state
    async fn update_status(
        &self,
        page_id: &str,
        property: &str,
        state: &str,
    ) -> Result<(), StoreError>;
}

/// The ability to download media bytes
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
