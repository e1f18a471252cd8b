//! Notion REST API adapter.
//!
//! Implements [`RemoteStore`] over the database-query, block-children and
//! page-update endpoints. Pagination is left to the caller: every method
//! returns exactly one page of results.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{RemoteStore, StatusFilter, StoreError};
use crate::domain::{Batch, RawBlock, RawPage};

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";

/// Default `Notion-Version` header
pub const DEFAULT_API_VERSION: &str = "2022-06-28";

/// Results requested per page
const PAGE_SIZE: u32 = 100;

/// Error body returned by the API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Connection settings for the Notion client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    pub token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

/// Notion API client
pub struct NotionClient {
    token: String,
    base_url: String,
    api_version: String,
    client: reqwest::Client,
}

impl NotionClient {
    /// Create a client against the public API
    pub fn new(token: impl Into<String>) -> Self {
        Self::from_config(NotionConfig {
            token: token.into(),
            base_url: default_base_url(),
            api_version: default_api_version(),
        })
    }

    /// Create from config
    pub fn from_config(config: NotionConfig) -> Self {
        Self {
            token: config.token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version,
            client: reqwest::Client::new(),
        }
    }

    /// Build API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.api_version)
    }

    /// Body for a database query
    fn query_body(filter: &StatusFilter, cursor: Option<&str>) -> serde_json::Value {
        let mut body = json!({
            "filter": filter.to_query(),
            "page_size": PAGE_SIZE,
        });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }
        body
    }

    /// Decode a success body, or turn an error status into `StoreError::Api`
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .map(|b| b.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RemoteStore for NotionClient {
    async fn query_pages(
        &self,
        database_id: &str,
        filter: &StatusFilter,
        cursor: Option<&str>,
    ) -> Result<Batch<RawPage>, StoreError> {
        let url = self.api_url(&format!("databases/{}/query", database_id));
        debug!(database_id, cursor, "Querying pages");

        let response = self
            .authorized(self.client.post(&url))
            .json(&Self::query_body(filter, cursor))
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn block_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<Batch<RawBlock>, StoreError> {
        let url = self.api_url(&format!("blocks/{}/children", block_id));
        debug!(block_id, cursor, "Listing block children");

        let mut query = vec![("page_size", PAGE_SIZE.to_string())];
        if let Some(cursor) = cursor {
            query.push(("start_cursor", cursor.to_string()));
        }

        let response = self
            .authorized(self.client.get(&url))
            .query(&query)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn update_status(
        &self,
        page_id: &str,
        property: &str,
        state: &str,
    ) -> Result<(), StoreError> {
        let url = self.api_url(&format!("pages/{}", page_id));

        let response = self
            .authorized(self.client.patch(&url))
            .json(&json!({
                "properties": { property: { "status": { "name": state } } }
            }))
            .send()
            .await?;

        let _: serde_json::Value = Self::decode(response).await?;
        Ok(())
    }
}
