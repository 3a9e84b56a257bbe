pub mod business;

pub use business::{
    BusinessRecord, CategoryRecord, HoursEntry, LocationRecord, SearchParams, SortOrder,
};
