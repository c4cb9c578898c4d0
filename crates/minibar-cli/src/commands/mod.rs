//! Command handler modules for the minibar CLI.
//!
//! Shared setup (config loading, opening the store) lives here.
//! Command-specific logic lives in the submodules.

pub mod db;
pub mod repl;
pub mod stock;

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use minibar_config::{BarConfig, UnusedKeyPolicy};
use minibar_db::StorageSettings;
use minibar_ledger::{Ledger, Price};
use tracing::warn;

/// Load layered config, or defaults when no paths are given, then apply env
/// overrides. Unused keys are warned about, not fatal.
pub fn load_config(paths: &[String]) -> Result<BarConfig> {
    let cfg = if paths.is_empty() {
        BarConfig::default()
    } else {
        let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
        let loaded = minibar_config::load_layered_yaml(&path_refs)?;
        let report = minibar_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
        for pointer in &report.unused_leaf_pointers {
            warn!(pointer = %pointer, "unused config key");
        }
        loaded.config
    };
    Ok(cfg.with_env_overrides())
}

pub fn storage_settings(cfg: &BarConfig) -> StorageSettings {
    StorageSettings {
        max_connections: cfg.storage.max_connections,
        busy_timeout: Duration::from_millis(cfg.storage.busy_timeout_ms),
    }
}

/// Apply the configured schema: `storage.schema_dir` if set, else the embedded set.
pub async fn apply_schema(pool: &minibar_db::SqlitePool, cfg: &BarConfig) -> Result<()> {
    match cfg.storage.schema_dir.as_deref() {
        Some(dir) => minibar_db::migrate_from_dir(pool, Path::new(dir)).await,
        None => minibar_db::migrate(pool).await,
    }
}

/// Connect, bootstrap the schema, and hand the pool to a ledger.
/// Any failure here is fatal: the bar does not open without a working store.
pub async fn open_ledger(cfg: &BarConfig) -> Result<Ledger> {
    let pool = minibar_db::connect(&cfg.storage.database_url, &storage_settings(cfg))
        .await
        .context("storage unavailable")?;
    apply_schema(&pool, cfg).await?;
    Ok(Ledger::new(pool))
}

/// Parse `name amount price`, whitespace separated.
pub fn parse_supply_line(line: &str) -> Result<(String, i64, Price)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [name, amount, price] = tokens.as_slice() else {
        bail!(
            "expected 3 values (drink amount price), got {}",
            tokens.len()
        );
    };
    let amount: i64 = amount
        .parse()
        .with_context(|| format!("amount must be a whole number, got '{amount}'"))?;
    let price: Price = price
        .parse()
        .with_context(|| format!("price must be a non-negative decimal, got '{price}'"))?;
    Ok((name.to_string(), amount, price))
}
