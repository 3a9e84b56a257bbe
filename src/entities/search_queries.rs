use sea_orm::entity::prelude::*;

/// Unique on (term, location, sort_by, page_size, max_results); see the
/// initial migration.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "search_queries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub term: String,
    pub location: String,
    pub sort_by: String,
    pub page_size: i32,
    pub max_results: i32,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::search_results::Entity")]
    SearchResults,
}

impl Related<super::search_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SearchResults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
