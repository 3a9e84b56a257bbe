use crate::config::Config;
use crate::db::Store;

pub async fn cmd_clear(config: &Config) -> anyhow::Result<()> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    store.clear_all().await?;
    store.close().await?;

    println!("✓ Cache cleared");
    Ok(())
}
