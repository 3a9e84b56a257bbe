use crate::config::Config;
use crate::models::SortOrder;
use crate::models::business::clamp_max_results;
use crate::services::{ExportError, ExportScope};
use crate::state::SharedState;

pub async fn cmd_export(
    config: &Config,
    term: Option<String>,
    location: Option<String>,
    sort_by: SortOrder,
    max_results: Option<u32>,
) -> anyhow::Result<()> {
    let scope = match (term, location) {
        (Some(term), Some(location)) => ExportScope::Query {
            term,
            location,
            sort_by,
        },
        _ => ExportScope::All,
    };

    let state = SharedState::new(config.clone()).await?;
    let result = state
        .export_service
        .export(&scope, max_results.map(clamp_max_results))
        .await;
    state.store.close().await?;

    match result {
        Ok(path) => {
            println!("✓ Exported to {}", path.display());
            Ok(())
        }
        Err(ExportError::Empty) => {
            println!("Nothing to export. Run a search first.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
