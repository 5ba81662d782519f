//! Raw-record normalization.
//!
//! The two upstreams use materially different schemas (a generic document
//! store and a commerce-catalog export), so every canonical attribute is
//! resolved through a fixed, ordered list of plausible source keys before
//! falling back to its default. Normalization is total: any input, including
//! `{}`, yields a fully-populated [`Property`], and normalizing an
//! already-canonical record is a no-op.

use super::{
    Coordinates, Property, Source, DEFAULT_BATHROOMS, DEFAULT_BEDROOMS, DEFAULT_COORDINATES,
    DEFAULT_IMAGE, DEFAULT_LOCATION, DEFAULT_SIZE_M2, DEFAULT_TITLE, PRICE_ON_REQUEST,
};
use serde_json::Value;
use uuid::Uuid;

/// Map an arbitrary raw record into the canonical shape.
pub fn normalize(raw: &Value) -> Property {
    Property {
        id: resolve_id(raw),
        title: resolve_text(raw, &["title", "name"]).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        location: resolve_text(raw, &["location", "address"])
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        price: resolve_price(raw),
        bedrooms: resolve_uint(raw, &["bedrooms", "beds"]).unwrap_or(DEFAULT_BEDROOMS),
        bathrooms: resolve_uint(raw, &["bathrooms", "baths"]).unwrap_or(DEFAULT_BATHROOMS),
        size: resolve_uint(raw, &["size", "area", "sqm"]).unwrap_or(DEFAULT_SIZE_M2),
        coordinates: resolve_coordinates(raw),
        image: resolve_image(raw),
        source: resolve_source(raw),
    }
}

/// Source identifier, trying `id`, then `_id` (plain or `{$oid}` export
/// shape), then a generated fallback.
fn resolve_id(raw: &Value) -> String {
    if let Some(s) = non_empty_str(&raw["id"]) {
        return s;
    }
    if let Some(n) = raw["id"].as_u64() {
        return n.to_string();
    }
    if let Some(s) = non_empty_str(&raw["_id"]) {
        return s;
    }
    if let Some(s) = non_empty_str(&raw["_id"]["$oid"]) {
        return s;
    }
    format!("gen-{}", Uuid::new_v4())
}

/// First non-empty string among the given keys.
fn resolve_text(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| non_empty_str(&raw[*k]))
}

/// First non-negative integer among the given keys; numeric strings count,
/// since catalog exports stringify everything.
fn resolve_uint(raw: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter().find_map(|k| value_as_uint(&raw[*k]))
}

fn resolve_price(raw: &Value) -> String {
    ["price", "regular_price", "sale_price"]
        .iter()
        .find_map(|k| price_string(&raw[*k]))
        .unwrap_or_else(|| PRICE_ON_REQUEST.to_string())
}

/// Coordinates: a `coordinates` object, then flat `lat`/`lng`, then
/// `latitude`/`longitude`, then a nested `location` object, then the
/// city-center default.
fn resolve_coordinates(raw: &Value) -> Coordinates {
    point_from(&raw["coordinates"], "lat", "lng")
        .or_else(|| point_from(raw, "lat", "lng"))
        .or_else(|| point_from(raw, "latitude", "longitude"))
        .or_else(|| point_from(&raw["location"], "lat", "lng"))
        .unwrap_or(DEFAULT_COORDINATES)
}

/// Image: a direct `image` field, then the first element of `images`
/// (string, or object with `src`/`url`), then `featured_image`, then
/// `thumbnail`, then the placeholder asset.
fn resolve_image(raw: &Value) -> String {
    if let Some(s) = image_url(&raw["image"]) {
        return s;
    }
    if let Some(first) = raw["images"].as_array().and_then(|a| a.first()) {
        if let Some(s) = image_url(first) {
            return s;
        }
    }
    if let Some(s) = image_url(&raw["featured_image"]) {
        return s;
    }
    if let Some(s) = image_url(&raw["thumbnail"]) {
        return s;
    }
    DEFAULT_IMAGE.to_string()
}

fn resolve_source(raw: &Value) -> Source {
    match raw["source"].as_str() {
        Some("mongodb") => Source::Mongodb,
        Some("woocommerce") => Source::Woocommerce,
        _ => Source::Unknown,
    }
}

fn non_empty_str(v: &Value) -> Option<String> {
    v.as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn value_as_uint(v: &Value) -> Option<u32> {
    if let Some(n) = v.as_u64() {
        return u32::try_from(n).ok();
    }
    v.as_str().and_then(|s| s.trim().parse::<u32>().ok())
}

/// Numbers become their decimal rendering; non-empty strings pass through.
fn price_string(v: &Value) -> Option<String> {
    if let Some(s) = non_empty_str(v) {
        return Some(s);
    }
    if let Some(n) = v.as_i64() {
        return Some(n.to_string());
    }
    if let Some(f) = v.as_f64() {
        if f.fract() == 0.0 {
            return Some((f as i64).to_string());
        }
        return Some(f.to_string());
    }
    None
}

fn point_from(v: &Value, lat_key: &str, lng_key: &str) -> Option<Coordinates> {
    let lat = coord_component(&v[lat_key])?;
    let lng = coord_component(&v[lng_key])?;
    Some(Coordinates { lat, lng })
}

fn coord_component(v: &Value) -> Option<f64> {
    if let Some(f) = v.as_f64() {
        return Some(f);
    }
    v.as_str().and_then(|s| s.trim().parse::<f64>().ok())
}

fn image_url(v: &Value) -> Option<String> {
    if let Some(s) = non_empty_str(v) {
        return Some(s);
    }
    non_empty_str(&v["src"]).or_else(|| non_empty_str(&v["url"]))
}
