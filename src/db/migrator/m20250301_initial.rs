use crate::entities::prelude::*;
use crate::entities::{attributes, business_categories, locations, search_queries, search_results};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Parents before children so foreign keys resolve.
        manager
            .create_table(
                schema
                    .create_table_from_entity(Businesses)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Categories)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(SearchQueries)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Locations)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(BusinessCategories)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(BusinessHours)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Attributes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(SearchResults)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_queries_unique")
                    .table(SearchQueries)
                    .col(search_queries::Column::Term)
                    .col(search_queries::Column::Location)
                    .col(search_queries::Column::SortBy)
                    .col(search_queries::Column::PageSize)
                    .col(search_queries::Column::MaxResults)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_results_unique")
                    .table(SearchResults)
                    .col(search_results::Column::SearchQueryId)
                    .col(search_results::Column::BusinessId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_business_categories_unique")
                    .table(BusinessCategories)
                    .col(business_categories::Column::BusinessId)
                    .col(business_categories::Column::CategoryId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attributes_business_key")
                    .table(Attributes)
                    .col(attributes::Column::BusinessId)
                    .col(attributes::Column::Key)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_locations_city")
                    .table(Locations)
                    .col(locations::Column::City)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchResults).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Attributes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BusinessHours).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BusinessCategories).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Locations).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SearchQueries).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Businesses).to_owned())
            .await?;

        Ok(())
    }
}
