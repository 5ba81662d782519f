//! Retry/cancellation controller — the public surface of the layer.
//!
//! [`PropertyFeed`] wraps the orchestrator with a bounded
//! exponential-backoff retry loop and last-request-wins supersession, and
//! publishes its observable state on a `tokio::sync::watch` channel.
//!
//! ## Supersession
//!
//! Every `load` mints a monotonically increasing generation token and
//! publishes it on an internal watch channel. An earlier call still waiting
//! or retrying both *aborts its in-flight work* (its fetch future is dropped
//! when the channel advances) and *discards its result* at apply time if its
//! token is no longer the newest. A slow early response therefore never
//! overwrites state set by a faster later request.

use crate::cache::{cache_key, PropertyCache};
use crate::config::FeedConfig;
use crate::fetch::client::MAX_PAGE_SIZE;
use crate::fetch::{FetchError, Orchestrator, SourceSelector};
use crate::model::{Property, Source};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Per-source record counts over the exposed list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub mongodb: usize,
    pub woocommerce: usize,
    pub unknown: usize,
}

impl SourceCounts {
    fn tally(properties: &[Property]) -> Self {
        let mut counts = SourceCounts::default();
        for p in properties {
            match p.source {
                Source::Mongodb => counts.mongodb += 1,
                Source::Woocommerce => counts.woocommerce += 1,
                Source::Unknown => counts.unknown += 1,
            }
        }
        counts
    }
}

/// Observable state consumed by presentation code.
#[derive(Debug, Clone, Serialize)]
pub struct FeedState {
    pub properties: Vec<Property>,
    pub loading: bool,
    /// Human-readable message of the last surfaced failure, if any.
    pub error: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub selector: SourceSelector,
    /// Record count returned by the most recent successful fetch.
    pub total: usize,
    /// Heuristic "there may be more" signal: true when the last fetch
    /// returned exactly the requested page size. Can report a false
    /// positive on an exact last full page; no upstream exposes an
    /// authoritative total.
    pub has_more: bool,
    pub source_counts: SourceCounts,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            properties: Vec::new(),
            loading: false,
            error: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            selector: SourceSelector::All,
            total: 0,
            has_more: false,
            source_counts: SourceCounts::default(),
        }
    }
}

/// Options for [`PropertyFeed::load`].
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Append to the exposed list (de-duplicated by id) instead of
    /// replacing it.
    pub append: bool,
    pub use_cache: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            append: false,
            use_cache: true,
        }
    }
}

/// Parameter overrides for [`PropertyFeed::change_filters`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub selector: Option<SourceSelector>,
}

/// Why a logical call produced no data to apply.
enum Abort {
    /// A newer call superseded this one; apply nothing, surface nothing.
    Superseded,
    /// All retry attempts were consumed.
    Failed(FetchError),
}

/// The aggregation layer's controller.
///
/// Cheap to share: take it by reference or wrap it in an `Arc`; all methods
/// take `&self`.
pub struct PropertyFeed {
    orchestrator: Orchestrator,
    cache: Arc<PropertyCache>,
    config: FeedConfig,
    generation: watch::Sender<u64>,
    state: watch::Sender<FeedState>,
}

impl PropertyFeed {
    pub fn new(config: FeedConfig, cache: Arc<PropertyCache>) -> Self {
        Self {
            orchestrator: Orchestrator::new(&config),
            cache,
            config,
            generation: watch::channel(0).0,
            state: watch::channel(FeedState::default()).0,
        }
    }

    /// Subscribe to state updates.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Load one page, superseding any still-in-flight prior call.
    ///
    /// On success the exposed list is replaced, or appended to when
    /// `opts.append` is set (first occurrence of each id wins). On
    /// exhausted retries the last error is surfaced and the list is left
    /// unchanged. A superseded call changes nothing.
    pub async fn load(
        &self,
        page: u32,
        page_size: u32,
        selector: SourceSelector,
        opts: LoadOptions,
    ) {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let token = self.mint_token();

        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let key = cache_key(selector, page, page_size);
        let cached = if opts.use_cache { self.cache.get(&key) } else { None };
        let result = match cached {
            Some(data) => {
                tracing::debug!(%key, "cache hit");
                Ok(data)
            }
            None => {
                let fetched = self.fetch_with_retry(page, page_size, selector, token).await;
                if let Ok(data) = &fetched {
                    self.cache.set(&key, data.clone());
                }
                fetched
            }
        };

        match result {
            Ok(data) => {
                if !self.apply_success(token, page, page_size, selector, opts.append, data) {
                    tracing::debug!(token, "load superseded, discarding result");
                }
            }
            Err(Abort::Superseded) => {}
            Err(Abort::Failed(e)) => {
                if self.apply_failure(token, &e) {
                    tracing::warn!(
                        "load failed after {} attempts: {e}",
                        self.config.max_attempts
                    );
                } else {
                    tracing::debug!(token, "load superseded, discarding failure");
                }
            }
        }
    }

    /// Apply a successful result unless a newer call has minted a later
    /// token. The token comparison runs inside the state write, so check and
    /// apply are serialized with competing calls on other worker threads —
    /// a stale call either observes the newer generation and aborts, or
    /// writes before the newer call applies and is overwritten.
    fn apply_success(
        &self,
        token: u64,
        page: u32,
        page_size: u32,
        selector: SourceSelector,
        append: bool,
        data: Vec<Property>,
    ) -> bool {
        let fetched = data.len();
        self.state.send_if_modified(|s| {
            if *self.generation.borrow() != token {
                return false;
            }
            if append {
                merge_unique(&mut s.properties, data);
            } else {
                s.properties = dedup_by_id(data);
            }
            s.loading = false;
            s.error = None;
            s.page = page;
            s.page_size = page_size;
            s.selector = selector;
            s.total = fetched;
            s.has_more = fetched as u32 == page_size;
            s.source_counts = SourceCounts::tally(&s.properties);
            true
        })
    }

    /// Surface a final failure under the same in-write token gate as
    /// [`Self::apply_success`].
    fn apply_failure(&self, token: u64, error: &FetchError) -> bool {
        self.state.send_if_modified(|s| {
            if *self.generation.borrow() != token {
                return false;
            }
            s.loading = false;
            s.error = Some(error.to_string());
            true
        })
    }

    /// Load the next page and append it. No-op while a load is in flight or
    /// when the last page gave no "more" signal.
    pub async fn load_more(&self) {
        let snapshot = self.state();
        if snapshot.loading || !snapshot.has_more {
            return;
        }
        self.load(
            snapshot.page + 1,
            snapshot.page_size,
            snapshot.selector,
            LoadOptions {
                append: true,
                use_cache: true,
            },
        )
        .await;
    }

    /// Drop the cached entry for the current page, clear the list, and
    /// reload bypassing the cache.
    pub async fn refresh(&self) {
        let snapshot = self.state();
        self.cache.invalidate(&cache_key(
            snapshot.selector,
            snapshot.page,
            snapshot.page_size,
        ));
        self.state.send_modify(|s| {
            s.properties.clear();
            s.total = 0;
            s.has_more = false;
            s.source_counts = SourceCounts::default();
        });
        self.load(
            snapshot.page,
            snapshot.page_size,
            snapshot.selector,
            LoadOptions {
                append: false,
                use_cache: false,
            },
        )
        .await;
    }

    /// Reset state and reload with new parameters, from page 1 unless
    /// explicitly overridden.
    pub async fn change_filters(&self, params: FeedParams) {
        let snapshot = self.state();
        let page = params.page.unwrap_or(1);
        let page_size = params.page_size.unwrap_or(snapshot.page_size);
        let selector = params.selector.unwrap_or(snapshot.selector);
        self.state.send_modify(|s| {
            *s = FeedState {
                page,
                page_size,
                selector,
                ..FeedState::default()
            };
        });
        self.load(page, page_size, selector, LoadOptions::default())
            .await;
    }

    fn mint_token(&self) -> u64 {
        let mut token = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            token = *g;
        });
        token
    }

    /// Explicit attempt/wait/retry loop, bounded by `max_attempts`. A
    /// supersession signal during flight or backoff aborts immediately
    /// without consuming an attempt.
    async fn fetch_with_retry(
        &self,
        page: u32,
        page_size: u32,
        selector: SourceSelector,
        token: u64,
    ) -> Result<Vec<Property>, Abort> {
        let mut generation = self.generation.subscribe();
        let mut attempt = 1u32;
        loop {
            let outcome = tokio::select! {
                res = self.orchestrator.fetch_page(page, page_size, selector) => res,
                _ = superseded(&mut generation, token) => return Err(Abort::Superseded),
            };
            match outcome {
                Ok(data) => return Ok(data),
                Err(e) if attempt >= self.config.max_attempts => {
                    return Err(Abort::Failed(e));
                }
                Err(e) => {
                    let delay = self.config.base_delay * 2u32.pow(attempt - 1);
                    tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, "fetch failed, retrying: {e}");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = superseded(&mut generation, token) => return Err(Abort::Superseded),
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Resolves once the published generation moves past `token`.
async fn superseded(generation: &mut watch::Receiver<u64>, token: u64) {
    loop {
        if *generation.borrow() > token {
            return;
        }
        if generation.changed().await.is_err() {
            // Sender gone: no newer call can ever arrive.
            std::future::pending::<()>().await;
        }
    }
}

/// Append `incoming` to `existing`, keeping the first occurrence of each id.
fn merge_unique(existing: &mut Vec<Property>, incoming: Vec<Property>) {
    let mut seen: HashSet<String> = existing.iter().map(|p| p.id.clone()).collect();
    for property in incoming {
        if seen.insert(property.id.clone()) {
            existing.push(property);
        }
    }
}

/// De-duplicate a fresh page by id, preserving first-seen order.
fn dedup_by_id(properties: Vec<Property>) -> Vec<Property> {
    let mut out = Vec::new();
    merge_unique(&mut out, properties);
    out
}
