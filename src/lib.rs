//! propfeed — property listing aggregation layer.
//!
//! Fetches property listings from two independent upstream HTTP services
//! (a document-store listing endpoint and a commerce-catalog export),
//! normalizes their heterogeneous record shapes into one canonical model,
//! caches pages with a TTL, retries failures with exponential backoff, and
//! cancels superseded requests so a slow response never overwrites a newer
//! one. Presentation code consumes the layer through [`PropertyFeed`] and
//! its observable [`FeedState`].

pub mod cache;
pub mod config;
pub mod controller;
pub mod fetch;
pub mod filter;
pub mod model;

pub use cache::PropertyCache;
pub use config::FeedConfig;
pub use controller::{FeedParams, FeedState, LoadOptions, PropertyFeed};
pub use fetch::{FetchError, Orchestrator, SourceSelector};
pub use filter::{filter, FilterCriteria};
pub use model::normalize::normalize;
pub use model::{Coordinates, Property, Source};
