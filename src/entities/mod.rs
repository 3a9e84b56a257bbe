pub mod prelude;

pub mod attributes;
pub mod business_categories;
pub mod business_hours;
pub mod businesses;
pub mod categories;
pub mod locations;
pub mod search_queries;
pub mod search_results;
