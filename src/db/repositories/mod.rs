pub mod business;
pub mod search;
