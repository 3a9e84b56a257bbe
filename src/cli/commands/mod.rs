mod clear;
mod export;
mod search;

pub use clear::cmd_clear;
pub use export::cmd_export;
pub use search::cmd_search;
