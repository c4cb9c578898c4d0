//! Shared fixtures for cross-crate scenario tests.
//!
//! Every fixture opens a private, fully migrated store so scenarios never see
//! each other's rows.

use std::path::Path;

use anyhow::{Context, Result};
use minibar_db::{SqlitePool, StorageSettings, MEMORY_URL};
use minibar_ledger::Ledger;
use minibar_schemas::{Price, StockItem};

/// Fresh in-memory store with the schema applied.
pub async fn fresh_pool() -> Result<SqlitePool> {
    let pool = minibar_db::connect(MEMORY_URL, &StorageSettings::default()).await?;
    minibar_db::migrate(&pool).await?;
    Ok(pool)
}

pub async fn fresh_ledger() -> Result<Ledger> {
    Ok(Ledger::new(fresh_pool().await?))
}

/// File-backed store under `dir`, for scenarios that need several real
/// connections (concurrency) or a reopen.
pub async fn file_pool(dir: &Path, max_connections: u32) -> Result<SqlitePool> {
    let url = format!("sqlite://{}", dir.join("bar_storage.db").display());
    let settings = StorageSettings {
        max_connections,
        ..StorageSettings::default()
    };
    let pool = minibar_db::connect(&url, &settings).await?;
    minibar_db::migrate(&pool).await?;
    Ok(pool)
}

/// Parse a decimal literal; panics on bad test input.
pub fn price(s: &str) -> Price {
    match s.parse() {
        Ok(p) => p,
        Err(e) => panic!("bad test price {s:?}: {e:#}"),
    }
}

/// Row counts of (stock_items, operations).
pub async fn row_counts(pool: &SqlitePool) -> Result<(i64, i64)> {
    let (items,): (i64,) = sqlx::query_as("select count(*) from stock_items")
        .fetch_one(pool)
        .await
        .context("count stock_items failed")?;
    let (ops,): (i64,) = sqlx::query_as("select count(*) from operations")
        .fetch_one(pool)
        .await
        .context("count operations failed")?;
    Ok((items, ops))
}

/// Current row for `name`, including items with zero quantity.
pub async fn item(pool: &SqlitePool, name: &str) -> Result<Option<StockItem>> {
    minibar_db::find_item_by_name(pool, name).await
}
