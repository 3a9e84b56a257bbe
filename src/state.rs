use std::sync::Arc;
use std::time::Duration;

use crate::clients::YelpClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{BusinessSource, ExportService, SearchService};

/// Build a shared HTTP client for upstream calls.
/// Reused across requests so connections are pooled.
fn build_shared_http_client(timeout_seconds: u64, user_agent: &str) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(user_agent)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub search_service: Arc<SearchService>,

    pub export_service: Arc<ExportService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client =
            build_shared_http_client(config.yelp.request_timeout_seconds, &config.yelp.user_agent)?;
        let source: Arc<dyn BusinessSource> =
            Arc::new(YelpClient::new(http_client, &config.yelp));
        let search_service = Arc::new(SearchService::new(store.clone(), source));
        let export_service = Arc::new(ExportService::new(
            store.clone(),
            &config.export.export_dir,
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            search_service,
            export_service,
        })
    }
}
