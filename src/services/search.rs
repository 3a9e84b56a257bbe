//! Cache-or-fetch resolution of business searches.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::db::{InsertOutcome, Store};
use crate::models::business::{BusinessRecord, SearchParams};

/// Where businesses come from on a cache miss.
#[async_trait]
pub trait BusinessSource: Send + Sync {
    /// Fetches up to `params.max_results` businesses. Failures surface as a
    /// short (possibly empty) result, never as an error.
    async fn fetch(&self, params: &SearchParams) -> Vec<BusinessRecord>;
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SearchError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Clone)]
pub struct SearchService {
    store: Store,
    source: Arc<dyn BusinessSource>,
}

impl SearchService {
    #[must_use]
    pub fn new(store: Store, source: Arc<dyn BusinessSource>) -> Self {
        Self { store, source }
    }

    /// Serves `params` from the store when this exact query was fetched
    /// before, otherwise fetches upstream and stores what came back.
    ///
    /// A hit returns everything stored for (term, location, sort order),
    /// regardless of the page size and result cap it was fetched with.
    /// Failures while storing fetched businesses are logged, not returned.
    pub async fn resolve(&self, params: &SearchParams) -> Result<Vec<BusinessRecord>, SearchError> {
        if self.store.is_query_cached(params).await? {
            if let Some(businesses) = self
                .store
                .businesses_for_query(&params.term, &params.location, params.sort_by)
                .await?
            {
                metrics::counter!("search_cache_total", "result" => "hit").increment(1);
                info!(
                    term = %params.term,
                    location = %params.location,
                    count = businesses.len(),
                    "Serving search from cache"
                );
                return Ok(businesses);
            }
        }

        metrics::counter!("search_cache_total", "result" => "miss").increment(1);
        let businesses = self.source.fetch(params).await;

        if businesses.is_empty() {
            debug!(term = %params.term, location = %params.location, "Nothing fetched, not caching");
            return Ok(businesses);
        }

        self.persist(params, &businesses).await;
        Ok(businesses)
    }

    async fn persist(&self, params: &SearchParams, businesses: &[BusinessRecord]) {
        let query = match self.store.insert_search_query(params).await {
            Ok(query) => query,
            Err(e) => {
                error!("Failed to record search query '{}': {}", params.term, e);
                return;
            }
        };

        let mut inserted = 0_u64;
        for business in businesses {
            match self.store.insert_business(business, &query).await {
                Ok(InsertOutcome::Inserted) => inserted += 1,
                Ok(InsertOutcome::AlreadyExists) => {}
                Err(e) => error!("Failed to store business {}: {}", business.id, e),
            }
        }

        metrics::counter!("businesses_inserted_total").increment(inserted);
        info!(
            query_id = query.id,
            fetched = businesses.len(),
            inserted,
            "Cached search results"
        );
    }
}
