//! Request orchestrator — fan-out across upstream sources with
//! partial-failure tolerance.
//!
//! With the `All` selector both requests run concurrently and each side
//! resolves on its own; one source going down degrades to the surviving
//! source's data and is only logged. The call fails only when every
//! configured source failed. Each record is tagged with the endpoint it
//! actually came from — the orchestrator's knowledge of which source it
//! queried is authoritative, whatever the raw record claims.

use super::client::SourceClient;
use super::{FetchError, FetchResult, SourceSelector};
use crate::config::FeedConfig;
use crate::model::normalize::normalize;
use crate::model::{Property, Source};

/// Fans page requests out to the configured sources and merges the results.
#[derive(Clone)]
pub struct Orchestrator {
    client: SourceClient,
}

impl Orchestrator {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            client: SourceClient::new(config),
        }
    }

    /// Fetch one normalized, provenance-tagged page.
    pub async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        selector: SourceSelector,
    ) -> FetchResult<Vec<Property>> {
        match selector {
            SourceSelector::Mongodb => self.fetch_source(Source::Mongodb, page, page_size).await,
            SourceSelector::Woocommerce => {
                self.fetch_source(Source::Woocommerce, page, page_size).await
            }
            SourceSelector::All => {
                // Both sides resolve on their own; a failure of one never
                // short-circuits the other.
                let (mongo, woo) = futures::future::join(
                    self.fetch_source(Source::Mongodb, page, page_size),
                    self.fetch_source(Source::Woocommerce, page, page_size),
                )
                .await;

                let mut merged = Vec::new();
                let mut failures = Vec::new();
                for result in [mongo, woo] {
                    match result {
                        Ok(mut records) => merged.append(&mut records),
                        Err(e) => {
                            tracing::warn!("source failed, degrading to survivors: {e}");
                            failures.push(e);
                        }
                    }
                }

                if merged.is_empty() && !failures.is_empty() {
                    return Err(FetchError::AllSourcesFailed(failures));
                }
                tracing::debug!(
                    page,
                    records = merged.len(),
                    degraded = !failures.is_empty(),
                    "merged listing page"
                );
                Ok(merged)
            }
        }
    }

    async fn fetch_source(
        &self,
        source: Source,
        page: u32,
        page_size: u32,
    ) -> FetchResult<Vec<Property>> {
        let raw = self.client.fetch_raw(source, page, page_size).await?;
        Ok(raw
            .iter()
            .map(|record| {
                let mut property = normalize(record);
                property.source = source;
                property
            })
            .collect())
    }
}
