//! Upstream fetch layer — per-source HTTP clients and the fan-out
//! orchestrator that merges their results.

pub mod client;
pub mod orchestrator;

pub use client::{SourceClient, MAX_PAGE_SIZE};
pub use orchestrator::Orchestrator;

use crate::model::Source;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-specified choice of which upstream(s) to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSelector {
    #[default]
    All,
    Mongodb,
    Woocommerce,
}

impl SourceSelector {
    /// Concrete sources this selector fans out to.
    pub fn sources(&self) -> &'static [Source] {
        match self {
            SourceSelector::All => &[Source::Mongodb, Source::Woocommerce],
            SourceSelector::Mongodb => &[Source::Mongodb],
            SourceSelector::Woocommerce => &[Source::Woocommerce],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSelector::All => "all",
            SourceSelector::Mongodb => "mongodb",
            SourceSelector::Woocommerce => "woocommerce",
        }
    }
}

impl fmt::Display for SourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(SourceSelector::All),
            "mongodb" => Ok(SourceSelector::Mongodb),
            "woocommerce" => Ok(SourceSelector::Woocommerce),
            other => Err(format!(
                "unknown source selector '{other}' (expected all, mongodb or woocommerce)"
            )),
        }
    }
}

/// Errors from the fetch layer.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("{0} request failed: {1}")]
    Request(Source, String),

    #[error("{0} returned HTTP {1}")]
    Status(Source, u16),

    #[error("{0} returned a non-array body")]
    Decode(Source),

    #[error("all property sources failed: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    AllSourcesFailed(Vec<FetchError>),
}

/// Convenience result type for the fetch layer.
pub type FetchResult<T> = Result<T, FetchError>;
