use anyhow::{Context, Result};
use minibar_config::BarConfig;

use super::{apply_schema, storage_settings};

/// Connectivity and schema presence. Does not migrate.
pub async fn status(cfg: &BarConfig) -> Result<()> {
    let pool = minibar_db::connect(&cfg.storage.database_url, &storage_settings(cfg))
        .await
        .context("storage unavailable")?;
    let s = minibar_db::status(&pool).await?;
    println!(
        "db_ok={} has_stock_items_table={} has_operations_table={} schema_version={}",
        s.ok,
        s.has_stock_items_table,
        s.has_operations_table,
        s.schema_version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    Ok(())
}

pub async fn migrate(cfg: &BarConfig) -> Result<()> {
    let pool = minibar_db::connect(&cfg.storage.database_url, &storage_settings(cfg))
        .await
        .context("storage unavailable")?;
    apply_schema(&pool, cfg).await?;
    println!("migrations_applied=true");
    Ok(())
}
