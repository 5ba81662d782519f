//! Canonical property model.
//!
//! One fixed record shape used throughout the layer regardless of which
//! upstream produced the raw data. Every field is populated after
//! normalization — consumers never see a missing attribute.

pub mod normalize;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder title for records without one.
pub const DEFAULT_TITLE: &str = "Property in Madrid";
/// Placeholder location for records without one.
pub const DEFAULT_LOCATION: &str = "Madrid, Spain";
/// Price sentinel for records that carry no price at all.
pub const PRICE_ON_REQUEST: &str = "Consult";
/// Bedrooms assumed when the source omits the field.
pub const DEFAULT_BEDROOMS: u32 = 2;
/// Bathrooms assumed when the source omits the field.
pub const DEFAULT_BATHROOMS: u32 = 1;
/// Surface in square meters assumed when the source omits the field.
pub const DEFAULT_SIZE_M2: u32 = 80;
/// Local placeholder asset used when no image can be resolved.
pub const DEFAULT_IMAGE: &str = "/images/property-placeholder.jpg";

/// Geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Madrid city center, used when a source has no geolocation.
pub const DEFAULT_COORDINATES: Coordinates = Coordinates {
    lat: 40.4168,
    lng: -3.7038,
};

/// Provenance tag — which upstream produced the raw record.
///
/// Never inferred beyond what the source declares or the orchestrator
/// assigns after querying a concrete endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Mongodb,
    Woocommerce,
    #[default]
    Unknown,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Mongodb => "mongodb",
            Source::Woocommerce => "woocommerce",
            Source::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized property listing.
///
/// All fields are always present; absent source data is replaced by the
/// documented defaults during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Unique within any list exposed to callers. Derived from the source
    /// identifier, or a generated fallback when the source has none.
    pub id: String,
    pub title: String,
    /// Free-text location.
    pub location: String,
    /// Numeric-looking string, or [`PRICE_ON_REQUEST`] when absent.
    pub price: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    /// Surface in square meters.
    pub size: u32,
    pub coordinates: Coordinates,
    /// Image URL or local asset path.
    pub image: String,
    pub source: Source,
}
