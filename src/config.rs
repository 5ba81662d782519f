//! Layer configuration.

use crate::cache;
use crate::model::Source;
use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

/// Environment override for the document-store endpoint.
pub const ENV_MONGODB_URL: &str = "PROPFEED_MONGODB_URL";
/// Environment override for the commerce-catalog endpoint.
pub const ENV_WOOCOMMERCE_URL: &str = "PROPFEED_WOOCOMMERCE_URL";

/// Tunables for the aggregation layer.
///
/// Defaults match production behavior: 30 s request timeout, 5-minute cache
/// TTL, 100 cached pages, 3 attempts with a 1 s base backoff delay.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Document-store listing endpoint (returns a JSON array).
    pub mongodb_endpoint: String,
    /// Commerce-catalog listing endpoint (returns a JSON array).
    pub woocommerce_endpoint: String,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    /// Total attempts per logical call, first try included.
    pub max_attempts: u32,
    /// Backoff delay before the second attempt; doubles per attempt.
    pub base_delay: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            mongodb_endpoint: "http://localhost:3000/api/properties".to_string(),
            woocommerce_endpoint: "http://localhost:3000/api/woocommerce".to_string(),
            request_timeout: Duration::from_secs(30),
            cache_ttl: cache::DEFAULT_TTL,
            cache_capacity: cache::DEFAULT_CAPACITY,
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl FeedConfig {
    /// Defaults with endpoint overrides taken from the environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(ENV_MONGODB_URL) {
            config.mongodb_endpoint = validated(&value, ENV_MONGODB_URL)?;
        }
        if let Ok(value) = std::env::var(ENV_WOOCOMMERCE_URL) {
            config.woocommerce_endpoint = validated(&value, ENV_WOOCOMMERCE_URL)?;
        }
        Ok(config)
    }

    /// Endpoint for a concrete source. `Unknown` has no endpoint.
    pub fn endpoint(&self, source: Source) -> Option<&str> {
        match source {
            Source::Mongodb => Some(&self.mongodb_endpoint),
            Source::Woocommerce => Some(&self.woocommerce_endpoint),
            Source::Unknown => None,
        }
    }
}

fn validated(value: &str, var: &str) -> Result<String> {
    Url::parse(value).with_context(|| format!("{var} is not a valid URL: {value}"))?;
    Ok(value.to_string())
}
