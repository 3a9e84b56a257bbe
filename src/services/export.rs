//! CSV export of cached businesses.

use std::fmt::Write as _;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::db::Store;
use crate::models::business::{BusinessRecord, SortOrder, flatten_attributes};

pub const CSV_HEADERS: [&str; 21] = [
    "id",
    "name",
    "alias",
    "rating",
    "review_count",
    "price",
    "phone",
    "display_phone",
    "is_closed",
    "url",
    "distance",
    "address",
    "city",
    "state",
    "zip_code",
    "country",
    "latitude",
    "longitude",
    "categories",
    "business_hours",
    "attributes",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No businesses found to export")]
    Empty,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<anyhow::Error> for ExportError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Which cached businesses to export.
#[derive(Debug, Clone)]
pub enum ExportScope {
    All,
    Query {
        term: String,
        location: String,
        sort_by: SortOrder,
    },
}

#[derive(Clone)]
pub struct ExportService {
    store: Store,
    export_dir: PathBuf,
}

impl ExportService {
    #[must_use]
    pub fn new(store: Store, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            export_dir: export_dir.into(),
        }
    }

    /// Writes the businesses in `scope`, at most `max_results` of them, to a
    /// new CSV file and returns its path.
    pub async fn export(
        &self,
        scope: &ExportScope,
        max_results: Option<u32>,
    ) -> Result<PathBuf, ExportError> {
        let mut businesses = match scope {
            ExportScope::All => self.store.all_businesses().await?,
            ExportScope::Query {
                term,
                location,
                sort_by,
            } => self
                .store
                .businesses_for_query(term, location, *sort_by)
                .await?
                .unwrap_or_default(),
        };

        if let Some(max) = max_results {
            businesses.truncate(max as usize);
        }

        self.write(&businesses).await
    }

    pub async fn write(&self, businesses: &[BusinessRecord]) -> Result<PathBuf, ExportError> {
        if businesses.is_empty() {
            return Err(ExportError::Empty);
        }

        tokio::fs::create_dir_all(&self.export_dir).await?;

        let path = self.export_dir.join(export_file_name());
        tokio::fs::write(&path, render_csv(businesses)).await?;

        info!(
            path = %path.display(),
            rows = businesses.len(),
            "CSV export written"
        );
        Ok(path)
    }
}

fn export_file_name() -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("businesses_{timestamp}_{}.csv", &suffix[..8])
}

/// Quotes a field only when it needs it.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn opt_display<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[must_use]
pub fn render_csv(businesses: &[BusinessRecord]) -> String {
    let mut csv = CSV_HEADERS.join(",");
    csv.push('\n');

    for b in businesses {
        let categories = b
            .categories
            .iter()
            .map(|c| c.title.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let hours = b
            .business_hours
            .iter()
            .map(|h| format!("{}:{}-{}", h.day, h.start_time, h.end_time))
            .collect::<Vec<_>>()
            .join("; ");

        let attributes = flatten_attributes(&b.attributes)
            .into_iter()
            .map(|(key, value)| format!("{key}:{}", value.unwrap_or_default()))
            .collect::<Vec<_>>()
            .join("; ");

        let row = [
            b.id.clone(),
            b.name.clone(),
            b.alias.clone(),
            b.rating.to_string(),
            b.review_count.to_string(),
            b.price.clone().unwrap_or_default(),
            b.phone.clone().unwrap_or_default(),
            b.display_phone.clone().unwrap_or_default(),
            b.is_closed.to_string(),
            b.url.clone(),
            opt_display(b.distance),
            b.location.address1.clone().unwrap_or_default(),
            b.location.city.clone(),
            b.location.state.clone(),
            b.location.zip_code.clone(),
            b.location.country.clone(),
            opt_display(b.location.latitude),
            opt_display(b.location.longitude),
            categories,
            hours,
            attributes,
        ];

        let line = row
            .iter()
            .map(|field| csv_field(field))
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(csv, "{line}");
    }

    csv
}
