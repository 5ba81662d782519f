//! Async HTTP client for the upstream listing endpoints.
//!
//! Not much more than reqwest with a timeout: one GET per (source, page)
//! returning the raw JSON array. Anything other than a 2xx with an array
//! body is a failure for that source. Retries and backoff live a level up,
//! in the controller.

use super::{FetchError, FetchResult};
use crate::config::FeedConfig;
use crate::model::Source;
use serde_json::Value;

/// Hard cap on requested page size, applied regardless of caller input.
pub const MAX_PAGE_SIZE: u32 = 50;

/// HTTP client shared by all upstream sources.
#[derive(Clone)]
pub struct SourceClient {
    client: reqwest::Client,
    config: FeedConfig,
}

impl SourceClient {
    pub fn new(config: &FeedConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            config: config.clone(),
        }
    }

    /// Fetch one raw page from a single source.
    pub async fn fetch_raw(
        &self,
        source: Source,
        page: u32,
        page_size: u32,
    ) -> FetchResult<Vec<Value>> {
        let Some(endpoint) = self.config.endpoint(source) else {
            return Err(FetchError::Request(
                source,
                "no endpoint configured".to_string(),
            ));
        };
        let limit = page_size.min(MAX_PAGE_SIZE);

        tracing::debug!(%source, page, limit, "fetching listing page");
        let response = self
            .client
            .get(endpoint)
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await
            .map_err(|e| FetchError::Request(source, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(source, status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|_| FetchError::Decode(source))?;
        match body {
            Value::Array(records) => Ok(records),
            _ => Err(FetchError::Decode(source)),
        }
    }
}
