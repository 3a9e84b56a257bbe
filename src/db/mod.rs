use crate::entities::search_queries;
use crate::models::business::{BusinessRecord, SearchParams, SortOrder};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::business::InsertOutcome;

/// Handle to the local datastore. Cheap to clone; clones share one pool.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Closes the pool. Other clones of this store become unusable.
    pub async fn close(&self) -> Result<()> {
        self.conn.clone().close().await?;
        info!("Database connection closed");
        Ok(())
    }

    fn business_repo(&self) -> repositories::business::BusinessRepository {
        repositories::business::BusinessRepository::new(self.conn.clone())
    }

    fn search_repo(&self) -> repositories::search::SearchRepository {
        repositories::search::SearchRepository::new(self.conn.clone())
    }

    pub async fn business_exists(&self, business_id: &str) -> Result<bool> {
        self.business_repo().exists(business_id).await
    }

    pub async fn insert_business(
        &self,
        record: &BusinessRecord,
        query: &search_queries::Model,
    ) -> Result<InsertOutcome> {
        self.business_repo().insert(record, query).await
    }

    pub async fn insert_search_query(&self, params: &SearchParams) -> Result<search_queries::Model> {
        self.search_repo().get_or_create(params).await
    }

    pub async fn is_query_cached(&self, params: &SearchParams) -> Result<bool> {
        self.search_repo().is_cached(params).await
    }

    /// Full records stored for (term, location, sort order), or `None` when
    /// no matching query has been cached.
    pub async fn businesses_for_query(
        &self,
        term: &str,
        location: &str,
        sort_by: SortOrder,
    ) -> Result<Option<Vec<BusinessRecord>>> {
        let Some(ids) = self
            .search_repo()
            .business_ids_for(term, location, sort_by)
            .await?
        else {
            return Ok(None);
        };

        self.business_repo().load(&ids).await.map(Some)
    }

    pub async fn all_businesses(&self) -> Result<Vec<BusinessRecord>> {
        self.business_repo().all().await
    }

    pub async fn clear_all(&self) -> Result<()> {
        self.business_repo().clear_all().await
    }
}
