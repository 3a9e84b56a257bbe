pub mod export;
pub use export::{ExportError, ExportScope, ExportService};

pub mod search;
pub use search::{BusinessSource, SearchError, SearchService};
