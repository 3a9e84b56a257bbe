use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "businesses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub alias: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
    pub is_closed: bool,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    pub review_count: i32,
    pub rating: f64,
    pub price: Option<String>,
    pub phone: Option<String>,
    pub display_phone: Option<String>,
    pub distance: Option<f64>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::locations::Entity")]
    Location,
    #[sea_orm(has_many = "super::business_categories::Entity")]
    BusinessCategories,
    #[sea_orm(has_many = "super::business_hours::Entity")]
    BusinessHours,
    #[sea_orm(has_many = "super::attributes::Entity")]
    Attributes,
    #[sea_orm(has_many = "super::search_results::Entity")]
    SearchResults,
}

impl Related<super::locations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::business_hours::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessHours.def()
    }
}

impl Related<super::attributes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attributes.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        super::business_categories::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::business_categories::Relation::Business.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
