use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Hard per-call cap enforced by the upstream search endpoint.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Upper bound on results the upstream will page through for one query.
pub const MAX_TOTAL_RESULTS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    BestMatch,
    Rating,
    ReviewCount,
    Distance,
}

impl SortOrder {
    pub const ALL: [Self; 4] = [
        Self::BestMatch,
        Self::Rating,
        Self::ReviewCount,
        Self::Distance,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BestMatch => "best_match",
            Self::Rating => "rating",
            Self::ReviewCount => "review_count",
            Self::Distance => "distance",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort order '{0}', expected one of best_match, rating, review_count, distance")]
pub struct ParseSortOrderError(String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == s.trim())
            .ok_or_else(|| ParseSortOrderError(s.to_string()))
    }
}

/// One distinct logical query against the upstream directory.
///
/// `limit` is the requested page size and `max_results` the total number of
/// records wanted; both are clamped on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchParams {
    pub term: String,
    pub location: String,
    pub sort_by: SortOrder,
    pub limit: u32,
    pub max_results: u32,
}

impl SearchParams {
    #[must_use]
    pub fn new(
        term: impl Into<String>,
        location: impl Into<String>,
        sort_by: SortOrder,
        limit: u32,
        max_results: u32,
    ) -> Self {
        Self {
            term: term.into(),
            location: location.into(),
            sort_by,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            max_results: clamp_max_results(max_results),
        }
    }
}

#[must_use]
pub const fn clamp_max_results(max_results: u32) -> u32 {
    if max_results > MAX_TOTAL_RESULTS {
        MAX_TOTAL_RESULTS
    } else {
        max_results
    }
}

/// A business as returned by the search API, with its dependent rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub id: String,
    pub alias: String,
    pub name: String,
    pub image_url: Option<String>,
    pub is_closed: bool,
    pub url: String,
    pub review_count: i32,
    pub rating: f64,
    pub price: Option<String>,
    pub phone: Option<String>,
    pub display_phone: Option<String>,
    pub distance: Option<f64>,
    pub location: LocationRecord,
    pub categories: Vec<CategoryRecord>,
    pub business_hours: Vec<HoursEntry>,
    /// Free-form attributes. Freshly fetched records may nest objects; records
    /// read back from the store are flat string values.
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub address3: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub alias: String,
    pub title: String,
}

/// One open interval on one day. Day 0 is Monday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursEntry {
    pub day: i32,
    pub start_time: String,
    pub end_time: String,
    pub is_overnight: bool,
}

/// Flattens nested attribute objects into `(key, value)` pairs, joining
/// nested keys with `_`. Scalars are rendered as text, `null` as `None`,
/// arrays as their JSON text.
///
/// Keys are unique in the output. When two paths flatten to the same key
/// (`{"a_b": 1, "a": {"b": 2}}`) the one visited last wins, keeping the
/// position of the first.
#[must_use]
pub fn flatten_attributes(attributes: &Map<String, Value>) -> Vec<(String, Option<String>)> {
    let mut flat = Vec::new();
    let mut positions = HashMap::new();
    for (key, value) in attributes {
        flatten_into(key.clone(), value, &mut flat, &mut positions);
    }
    flat
}

fn flatten_into(
    key: String,
    value: &Value,
    out: &mut Vec<(String, Option<String>)>,
    positions: &mut HashMap<String, usize>,
) {
    let rendered = match value {
        Value::Object(nested) if !nested.is_empty() => {
            for (child, child_value) in nested {
                flatten_into(format!("{key}_{child}"), child_value, out, positions);
            }
            return;
        }
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    };

    if let Some(&index) = positions.get(&key) {
        out[index].1 = rendered;
    } else {
        positions.insert(key.clone(), out.len());
        out.push((key, rendered));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sort_order_round_trips_through_str() {
        for order in SortOrder::ALL {
            assert_eq!(order.as_str().parse::<SortOrder>().unwrap(), order);
        }
        assert!("newest".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default(), SortOrder::BestMatch);
    }

    #[test]
    fn search_params_clamp_limits() {
        let params = SearchParams::new("pizza", "Boston", SortOrder::Rating, 500, 5000);
        assert_eq!(params.limit, 50);
        assert_eq!(params.max_results, 1000);

        let params = SearchParams::new("pizza", "Boston", SortOrder::Rating, 0, 25);
        assert_eq!(params.limit, 1);
        assert_eq!(params.max_results, 25);
    }

    #[test]
    fn flatten_joins_nested_keys() {
        let attrs = json!({
            "menu_url": "https://example.com/menu",
            "ambience": { "casual": true, "romantic": false },
            "waitlist_reservation": null,
            "noise_level": 2
        });

        let mut flat = flatten_attributes(attrs.as_object().unwrap());
        flat.sort();
        assert_eq!(
            flat,
            vec![
                ("ambience_casual".to_string(), Some("true".to_string())),
                ("ambience_romantic".to_string(), Some("false".to_string())),
                (
                    "menu_url".to_string(),
                    Some("https://example.com/menu".to_string())
                ),
                ("noise_level".to_string(), Some("2".to_string())),
                ("waitlist_reservation".to_string(), None),
            ]
        );
    }

    #[test]
    fn flatten_collapses_colliding_keys() {
        let attrs = json!({
            "outdoor_seating": true,
            "outdoor": { "seating": false },
            "wifi": "free"
        });

        let flat = flatten_attributes(attrs.as_object().unwrap());
        let keys: Vec<&str> = flat.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"outdoor_seating"));
        assert!(keys.contains(&"wifi"));

        let seating = flat.iter().find(|(k, _)| k == "outdoor_seating").unwrap();
        assert!(matches!(seating.1.as_deref(), Some("true" | "false")));
    }

    #[test]
    fn flatten_keeps_empty_object_as_text() {
        let attrs = json!({ "parking": {} });
        let flat = flatten_attributes(attrs.as_object().unwrap());
        assert_eq!(flat, vec![("parking".to_string(), Some("{}".to_string()))]);
    }
}
