use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub alias: String,
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::business_categories::Entity")]
    BusinessCategories,
}

impl Related<super::business_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
