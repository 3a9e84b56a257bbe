use crate::entities::{prelude::*, search_queries, search_results};
use crate::models::business::{SearchParams, SortOrder};
use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select,
    Set,
};
use std::collections::HashSet;

pub struct SearchRepository {
    conn: DatabaseConnection,
}

impl SearchRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns the stored query for the full parameter tuple, creating it if
    /// absent.
    pub async fn get_or_create(&self, params: &SearchParams) -> Result<search_queries::Model> {
        SearchQueries::insert(search_queries::ActiveModel {
            term: Set(params.term.clone()),
            location: Set(params.location.clone()),
            sort_by: Set(params.sort_by.as_str().to_string()),
            page_size: Set(to_i32(params.limit)),
            max_results: Set(to_i32(params.max_results)),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                search_queries::Column::Term,
                search_queries::Column::Location,
                search_queries::Column::SortBy,
                search_queries::Column::PageSize,
                search_queries::Column::MaxResults,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await?;

        Self::exact(params)
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Search query missing after insert"))
    }

    pub async fn is_cached(&self, params: &SearchParams) -> Result<bool> {
        let count = Self::exact(params).count(&self.conn).await?;
        Ok(count > 0)
    }

    /// Business ids recorded under any query matching (term, location,
    /// sort order), in the order they were first linked. `None` when no such
    /// query exists.
    pub async fn business_ids_for(
        &self,
        term: &str,
        location: &str,
        sort_by: SortOrder,
    ) -> Result<Option<Vec<String>>> {
        let query_ids: Vec<i32> = SearchQueries::find()
            .filter(search_queries::Column::Term.eq(term))
            .filter(search_queries::Column::Location.eq(location))
            .filter(search_queries::Column::SortBy.eq(sort_by.as_str()))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|q| q.id)
            .collect();

        if query_ids.is_empty() {
            return Ok(None);
        }

        let links = SearchResults::find()
            .filter(search_results::Column::SearchQueryId.is_in(query_ids))
            .order_by_asc(search_results::Column::Id)
            .all(&self.conn)
            .await?;

        let mut seen = HashSet::new();
        let ids = links
            .into_iter()
            .filter(|link| seen.insert(link.business_id.clone()))
            .map(|link| link.business_id)
            .collect();

        Ok(Some(ids))
    }

    fn exact(params: &SearchParams) -> Select<SearchQueries> {
        SearchQueries::find()
            .filter(search_queries::Column::Term.eq(params.term.as_str()))
            .filter(search_queries::Column::Location.eq(params.location.as_str()))
            .filter(search_queries::Column::SortBy.eq(params.sort_by.as_str()))
            .filter(search_queries::Column::PageSize.eq(to_i32(params.limit)))
            .filter(search_queries::Column::MaxResults.eq(to_i32(params.max_results)))
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
