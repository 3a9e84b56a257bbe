#![allow(dead_code)]

use findit::config::{Config, YelpConfig};
use serde_json::{Value, json};
use std::path::Path;
use wiremock::{Request, Respond, ResponseTemplate};

pub const SEARCH_PATH: &str = "/v3/businesses/search";

pub fn business_json(i: usize) -> Value {
    json!({
        "id": format!("biz-{i}"),
        "alias": format!("biz-{i}-boston"),
        "name": format!("Pizzeria {i}"),
        "image_url": format!("https://img.example.com/{i}.jpg"),
        "is_closed": false,
        "url": format!("https://www.yelp.com/biz/biz-{i}-boston"),
        "review_count": 10 + i,
        "categories": [
            { "alias": "pizza", "title": "Pizza" },
            { "alias": "italian", "title": "Italian" }
        ],
        "rating": 4.0,
        "coordinates": { "latitude": 42.36, "longitude": -71.05 },
        "price": "$$",
        "location": {
            "address1": format!("{i} Hanover St"),
            "address2": "",
            "address3": null,
            "city": "Boston",
            "zip_code": "02113",
            "country": "US",
            "state": "MA"
        },
        "phone": "+16175550100",
        "display_phone": "(617) 555-0100",
        "distance": 100.0 * i as f64,
        "business_hours": [{
            "open": [
                { "is_overnight": false, "start": "1100", "end": "2200", "day": 0 },
                { "is_overnight": true, "start": "1700", "end": "0100", "day": 5 }
            ],
            "hours_type": "REGULAR",
            "is_open_now": true
        }],
        "attributes": {
            "menu_url": "https://example.com/menu",
            "ambience": { "casual": true, "romantic": false }
        }
    })
}

/// Serves `total` businesses, honoring the `offset` and `limit` query
/// parameters like the real endpoint.
pub struct PagedUpstream {
    pub total: usize,
}

impl Respond for PagedUpstream {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let param = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == name)
                .and_then(|(_, value)| value.parse::<usize>().ok())
                .unwrap_or(0)
        };

        let offset = param("offset").min(self.total);
        let end = (offset + param("limit")).min(self.total);
        let businesses: Vec<Value> = (offset..end).map(business_json).collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "businesses": businesses,
            "total": self.total
        }))
    }
}

pub fn yelp_config(server_uri: &str) -> YelpConfig {
    YelpConfig {
        api_url: format!("{server_uri}{SEARCH_PATH}"),
        api_key: "test-key".to_string(),
        request_timeout_seconds: 5,
        rate_limit_max_retries: 2,
        rate_limit_base_delay_ms: 1,
        rate_limit_max_delay_ms: 5,
        ..YelpConfig::default()
    }
}

/// A valid config pointing at a mock upstream, with the database and exports
/// inside `dir`.
pub fn test_config(server_uri: &str, dir: &Path) -> Config {
    let mut config = Config::default();
    config.yelp = yelp_config(server_uri);
    config.general.database_path = format!("sqlite:{}", dir.join("test.db").display());
    config.export.export_dir = dir.join("exports").display().to_string();
    config.observability.metrics_enabled = false;
    config
}

/// `(offset, limit)` of every request the upstream received, in order.
pub fn page_requests(requests: &[Request]) -> Vec<(usize, usize)> {
    requests
        .iter()
        .map(|r| {
            let get = |name: &str| {
                r.url
                    .query_pairs()
                    .find(|(key, _)| key == name)
                    .and_then(|(_, value)| value.parse().ok())
                    .unwrap_or(0)
            };
            (get("offset"), get("limit"))
        })
        .collect()
}
