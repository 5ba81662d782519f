//! Search-refinement filtering over canonical records.
//!
//! Pure predicate evaluation: criteria are combined conjunctively, absent
//! criteria always match, and the output preserves input order. Candidates
//! are already canonical ([`Property`]), so no per-record shape handling
//! happens here.

use crate::model::Property;
use serde::{Deserialize, Serialize};

/// Optional search criteria. Every bound is inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Case-insensitive substring match on the location field.
    pub location: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    /// Minimum number of bedrooms.
    pub bedrooms: Option<u32>,
    /// Minimum number of bathrooms.
    pub bathrooms: Option<u32>,
    /// Minimum surface in square meters.
    pub min_size: Option<u32>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        *self == FilterCriteria::default()
    }
}

/// Keep the properties satisfying every present criterion, in input order.
pub fn filter(properties: &[Property], criteria: &FilterCriteria) -> Vec<Property> {
    properties
        .iter()
        .filter(|p| matches(p, criteria))
        .cloned()
        .collect()
}

/// Whether a single property satisfies every present criterion.
pub fn matches(property: &Property, criteria: &FilterCriteria) -> bool {
    if let Some(needle) = &criteria.location {
        if !property
            .location
            .to_lowercase()
            .contains(&needle.to_lowercase())
        {
            return false;
        }
    }
    if criteria.min_price.is_some() || criteria.max_price.is_some() {
        // An unparsable price ("Consult") can never satisfy a price bound.
        let Some(price) = numeric_price(&property.price) else {
            return false;
        };
        if criteria.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if criteria.max_price.is_some_and(|max| price > max) {
            return false;
        }
    }
    if criteria.bedrooms.is_some_and(|min| property.bedrooms < min) {
        return false;
    }
    if criteria.bathrooms.is_some_and(|min| property.bathrooms < min) {
        return false;
    }
    if criteria.min_size.is_some_and(|min| property.size < min) {
        return false;
    }
    true
}

/// Price with all non-digit characters stripped ("€450.000" → 450000).
fn numeric_price(price: &str) -> Option<u64> {
    let digits: String = price.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::normalize::normalize;
    use serde_json::json;

    fn sample() -> Vec<Property> {
        [
            json!({"id": "p1", "title": "Flat", "price": 450000, "bedrooms": 2, "location": "Chamberí, Madrid"}),
            json!({"id": "p2", "title": "Loft", "price": "600000", "bedrooms": 3, "location": "Salamanca, Madrid"}),
            json!({"id": "p3", "title": "Studio", "bedrooms": 1, "size": 40, "location": "Lavapiés, Madrid"}),
        ]
        .iter()
        .map(normalize)
        .collect()
    }

    #[test]
    fn empty_criteria_returns_input_unchanged() {
        let props = sample();
        assert!(FilterCriteria::default().is_empty());
        assert_eq!(filter(&props, &FilterCriteria::default()), props);
    }

    #[test]
    fn criteria_are_conjunctive() {
        let props = sample();
        let criteria = FilterCriteria {
            min_price: Some(500_000),
            bedrooms: Some(2),
            ..Default::default()
        };
        let out = filter(&props, &criteria);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "p2");
    }

    #[test]
    fn location_match_is_case_insensitive_substring() {
        let props = sample();
        let criteria = FilterCriteria {
            location: Some("SALAMANCA".into()),
            ..Default::default()
        };
        let out = filter(&props, &criteria);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "p2");
    }

    #[test]
    fn price_bounds_strip_non_digits() {
        let p = normalize(&json!({"id": "x", "price": "€450.000"}));
        assert!(matches(
            &p,
            &FilterCriteria {
                min_price: Some(400_000),
                max_price: Some(500_000),
                ..Default::default()
            }
        ));
    }

    #[test]
    fn price_on_request_fails_any_price_bound() {
        let p = normalize(&json!({"id": "x"}));
        assert_eq!(p.price, "Consult");
        assert!(!matches(
            &p,
            &FilterCriteria {
                min_price: Some(1),
                ..Default::default()
            }
        ));
        // But it passes when no price bound is set.
        assert!(matches(&p, &FilterCriteria::default()));
    }

    #[test]
    fn minimum_thresholds_are_inclusive() {
        let props = sample();
        let criteria = FilterCriteria {
            bedrooms: Some(2),
            ..Default::default()
        };
        let out = filter(&props, &criteria);
        assert_eq!(
            out.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            ["p1", "p2"]
        );
    }

    #[test]
    fn min_size_threshold() {
        let props = sample();
        let criteria = FilterCriteria {
            min_size: Some(80),
            ..Default::default()
        };
        // p3 declares 40 m²; p1 and p2 got the 80 m² default.
        let out = filter(&props, &criteria);
        assert_eq!(
            out.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            ["p1", "p2"]
        );
    }
}
