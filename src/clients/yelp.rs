//! Client for the Yelp Fusion business search endpoint.
//!
//! Pages through `/v3/businesses/search` until the requested number of
//! records has been collected or the upstream runs dry. Rate-limited pages
//! are retried with capped exponential backoff; any other failure stops
//! pagination and whatever was collected so far is returned.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::YelpConfig;
use crate::models::business::{
    BusinessRecord, CategoryRecord, HoursEntry, LocationRecord, MAX_PAGE_SIZE, SearchParams,
    clamp_max_results,
};
use crate::services::search::BusinessSource;

#[derive(Debug, thiserror::Error)]
pub enum YelpError {
    #[error("rate limited by upstream")]
    RateLimited,

    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),
}

impl YelpError {
    const fn outcome(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Status { .. } => "error_status",
            Self::Transport(_) => "transport_error",
            Self::Url(_) => "invalid_url",
        }
    }
}

/// Backoff schedule for rate-limited pages.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    #[must_use]
    pub const fn from_config(config: &YelpConfig) -> Self {
        Self::new(
            config.rate_limit_max_retries,
            Duration::from_millis(config.rate_limit_base_delay_ms),
            Duration::from_millis(config.rate_limit_max_delay_ms),
        )
    }

    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `attempt` (zero-based): `base * 2^attempt`,
    /// capped at the max delay.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    businesses: Vec<YelpBusiness>,
}

#[derive(Debug, Deserialize)]
struct YelpBusiness {
    id: String,
    #[serde(default)]
    alias: String,
    #[serde(default)]
    name: String,
    image_url: Option<String>,
    #[serde(default)]
    is_closed: bool,
    #[serde(default)]
    url: String,
    #[serde(default)]
    review_count: i32,
    #[serde(default)]
    rating: f64,
    price: Option<String>,
    phone: Option<String>,
    display_phone: Option<String>,
    distance: Option<f64>,
    #[serde(default)]
    location: YelpLocation,
    #[serde(default)]
    coordinates: YelpCoordinates,
    #[serde(default)]
    categories: Vec<YelpCategory>,
    #[serde(default, alias = "hours")]
    business_hours: Vec<YelpHours>,
    #[serde(default)]
    attributes: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct YelpLocation {
    address1: Option<String>,
    address2: Option<String>,
    address3: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YelpCoordinates {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YelpCategory {
    alias: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct YelpHours {
    #[serde(default)]
    open: Vec<YelpOpenInterval>,
}

#[derive(Debug, Deserialize)]
struct YelpOpenInterval {
    day: i32,
    start: String,
    end: String,
    #[serde(default)]
    is_overnight: bool,
}

/// Empty address lines come back as `""` as often as `null`.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<YelpBusiness> for BusinessRecord {
    fn from(b: YelpBusiness) -> Self {
        let location = LocationRecord {
            address1: non_empty(b.location.address1),
            address2: non_empty(b.location.address2),
            address3: non_empty(b.location.address3),
            city: b.location.city.unwrap_or_default(),
            state: b.location.state.unwrap_or_default(),
            zip_code: b.location.zip_code.unwrap_or_default(),
            country: b.location.country.unwrap_or_default(),
            latitude: b.coordinates.latitude,
            longitude: b.coordinates.longitude,
        };

        let business_hours = b
            .business_hours
            .into_iter()
            .flat_map(|h| h.open)
            .map(|open| HoursEntry {
                day: open.day,
                start_time: open.start,
                end_time: open.end,
                is_overnight: open.is_overnight,
            })
            .collect();

        Self {
            id: b.id,
            alias: b.alias,
            name: b.name,
            image_url: non_empty(b.image_url),
            is_closed: b.is_closed,
            url: b.url,
            review_count: b.review_count,
            rating: b.rating,
            price: b.price,
            phone: non_empty(b.phone),
            display_phone: non_empty(b.display_phone),
            distance: b.distance,
            location,
            categories: b
                .categories
                .into_iter()
                .map(|c| CategoryRecord {
                    alias: c.alias,
                    title: c.title,
                })
                .collect(),
            business_hours,
            attributes: b.attributes.unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct YelpClient {
    client: Client,
    api_url: String,
    api_key: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl YelpClient {
    #[must_use]
    pub fn new(client: Client, config: &YelpConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.request_timeout_seconds),
            retry: RetryPolicy::from_config(config),
        }
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn page_url(&self, params: &SearchParams, limit: u32, offset: usize) -> Result<Url, YelpError> {
        let mut url = Url::parse(&self.api_url)?;
        url.query_pairs_mut()
            .append_pair("term", &params.term)
            .append_pair("location", &params.location)
            .append_pair("sort_by", params.sort_by.as_str())
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        Ok(url)
    }

    /// Requests a single page.
    pub async fn fetch_page(
        &self,
        params: &SearchParams,
        limit: u32,
        offset: usize,
    ) -> Result<Vec<BusinessRecord>, YelpError> {
        let url = self.page_url(params, limit, offset)?;
        debug!(offset, limit, "Requesting upstream page");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(YelpError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YelpError::Status { status, body });
        }

        let page: SearchResponse = response.json().await?;
        Ok(page.businesses.into_iter().map(BusinessRecord::from).collect())
    }

    /// Requests one page, retrying it while the upstream rate-limits us and
    /// the retry budget lasts.
    async fn fetch_page_with_backoff(
        &self,
        params: &SearchParams,
        limit: u32,
        offset: usize,
    ) -> Result<Vec<BusinessRecord>, YelpError> {
        let mut attempt = 0;
        loop {
            match self.fetch_page(params, limit, offset).await {
                Err(YelpError::RateLimited) if attempt < self.retry.max_retries() => {
                    metrics::counter!("upstream_requests_total", "outcome" => "rate_limited")
                        .increment(1);
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        offset,
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Rate limited by Yelp, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Collects up to `params.max_results` records, sequentially page by page.
    ///
    /// Never fails: on error the records gathered before it are returned.
    pub async fn fetch(&self, params: &SearchParams) -> Vec<BusinessRecord> {
        let max_results = clamp_max_results(params.max_results) as usize;
        let page_size = params.limit.clamp(1, MAX_PAGE_SIZE) as usize;
        let mut results: Vec<BusinessRecord> = Vec::new();

        while results.len() < max_results {
            let remaining = max_results - results.len();
            let batch = remaining.min(page_size);
            let batch = u32::try_from(batch).unwrap_or(MAX_PAGE_SIZE);
            let offset = results.len();

            match self.fetch_page_with_backoff(params, batch, offset).await {
                Ok(page) if page.is_empty() => {
                    metrics::counter!("upstream_requests_total", "outcome" => "success")
                        .increment(1);
                    debug!(offset, "Upstream returned an empty page, stopping");
                    break;
                }
                Ok(page) => {
                    metrics::counter!("upstream_requests_total", "outcome" => "success")
                        .increment(1);
                    results.extend(page);
                }
                Err(e) => {
                    metrics::counter!("upstream_requests_total", "outcome" => e.outcome())
                        .increment(1);
                    warn!(offset, error = %e, "Yelp request failed, returning partial results");
                    break;
                }
            }
        }

        results.truncate(max_results);
        info!(
            term = %params.term,
            location = %params.location,
            count = results.len(),
            "Fetched businesses from Yelp"
        );
        results
    }
}

#[async_trait]
impl BusinessSource for YelpClient {
    async fn fetch(&self, params: &SearchParams) -> Vec<BusinessRecord> {
        Self::fetch(self, params).await
    }
}
