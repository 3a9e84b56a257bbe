pub mod yelp;

pub use yelp::{RetryPolicy, YelpClient, YelpError};
