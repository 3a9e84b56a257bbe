pub use super::attributes::Entity as Attributes;
pub use super::business_categories::Entity as BusinessCategories;
pub use super::business_hours::Entity as BusinessHours;
pub use super::businesses::Entity as Businesses;
pub use super::categories::Entity as Categories;
pub use super::locations::Entity as Locations;
pub use super::search_queries::Entity as SearchQueries;
pub use super::search_results::Entity as SearchResults;
