//! Storage engine: the stock table and the operation log in one SQLite store.
//!
//! The pool handle is always explicit. Contract functions in [`stock`] accept
//! any sqlx executor, so they run against the pool for reads or against the
//! connection of an open [`run_atomic`] unit for read-check-write sequences.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures_util::future::BoxFuture;
use sqlx::migrate::Migrator;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions};
use sqlx::Sqlite;
use tracing::{debug, info, warn};

mod error;
mod stock;

pub use error::{store_error, StoreError};
pub use stock::{
    adjust_item_quantity_and_price, append_operation, find_item_by_name, insert_item,
    list_items_with_positive_quantity, list_operations,
};

/// The store handle, re-exported so callers need not depend on sqlx.
pub use sqlx::sqlite::SqlitePool;

/// Private in-memory store; lives as long as the pool's single connection.
pub const MEMORY_URL: &str = "sqlite::memory:";

/// Attempts per atomic unit when SQLite reports a conflicting writer.
pub const MAX_ATOMIC_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Open (creating if missing) the store at `url`.
///
/// File stores use WAL journaling. In-memory stores are pinned to a single
/// connection that is never recycled, since each SQLite memory connection is
/// its own database.
pub async fn connect(url: &str, settings: &StorageSettings) -> Result<SqlitePool> {
    let in_memory = is_memory_url(url);

    let mut opts = SqliteConnectOptions::from_str(url)
        .map_err(|e| StoreError::Unavailable {
            reason: format!("invalid database url {url}: {e}"),
        })?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(settings.busy_timeout);
    if !in_memory {
        opts = opts.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_opts = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(settings.max_connections)
    };

    let pool = pool_opts
        .connect_with(opts)
        .await
        .map_err(|e| StoreError::Unavailable {
            reason: format!("failed to open {url}: {e}"),
        })?;

    debug!(url, in_memory, "storage connected");
    Ok(pool)
}

/// Apply the embedded schema migrations. Re-running on a current store is a no-op.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    info!("schema migrations applied");
    Ok(())
}

/// Apply migrations from an on-disk schema directory instead of the embedded set.
pub async fn migrate_from_dir(pool: &SqlitePool, dir: &Path) -> Result<()> {
    let migrator = Migrator::new(dir.to_path_buf())
        .await
        .with_context(|| format!("failed to load schema dir {}", dir.display()))?;
    migrator
        .run(pool)
        .await
        .with_context(|| format!("db migrate from {} failed", dir.display()))?;
    info!(dir = %dir.display(), "schema migrations applied");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbStatus {
    pub ok: bool,
    pub has_stock_items_table: bool,
    pub has_operations_table: bool,
    /// Latest successfully applied migration, if any.
    pub schema_version: Option<i64>,
}

/// Connectivity + schema presence.
pub async fn status(pool: &SqlitePool) -> Result<DbStatus> {
    let (one,): (i64,) = sqlx::query_as("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let has_stock_items_table = table_exists(pool, "stock_items").await?;
    let has_operations_table = table_exists(pool, "operations").await?;

    let schema_version = if table_exists(pool, "_sqlx_migrations").await? {
        let (v,): (Option<i64>,) =
            sqlx::query_as("select max(version) from _sqlx_migrations where success = 1")
                .fetch_one(pool)
                .await
                .context("status schema version query failed")?;
        v
    } else {
        None
    };

    Ok(DbStatus {
        ok: one == 1,
        has_stock_items_table,
        has_operations_table,
        schema_version,
    })
}

async fn table_exists(pool: &SqlitePool, table: &str) -> Result<bool> {
    let (n,): (i64,) =
        sqlx::query_as("select count(*) from sqlite_master where type = 'table' and name = ?1")
            .bind(table)
            .fetch_one(pool)
            .await
            .with_context(|| format!("table-exists query failed for {table}"))?;
    Ok(n > 0)
}

/// Run `unit` as one all-or-nothing transaction.
///
/// The unit opens with `BEGIN IMMEDIATE`, so it holds the store's write lock
/// from its first read to commit. Concurrent units queue on the busy timeout
/// instead of reading a snapshot that a later write would invalidate. `Ok`
/// commits, `Err` rolls back every write the unit made and is returned
/// unchanged. If the lock is still not granted within the busy timeout
/// (SQLITE_BUSY/LOCKED) the unit is re-run from its first read, up to
/// [`MAX_ATOMIC_ATTEMPTS`] times. The unit must therefore be safe to re-run:
/// it may only touch storage through the connection it is given.
///
/// ```ignore
/// let id = minibar_db::run_atomic(&pool, |conn| {
///     let name = name.clone();
///     Box::pin(async move { minibar_db::insert_item(&mut *conn, &name, 1, price).await })
/// })
/// .await?;
/// ```
pub async fn run_atomic<T, F>(pool: &SqlitePool, mut unit: F) -> Result<T>
where
    T: Send,
    F: for<'c> FnMut(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T>> + Send,
{
    let mut attempt = 1;
    loop {
        match run_once(pool, &mut unit).await {
            Err(e) if is_busy(&e) && attempt < MAX_ATOMIC_ATTEMPTS => {
                warn!(attempt, error = %e, "atomic unit did not get the write lock; retrying");
                tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

async fn run_once<T, F>(pool: &SqlitePool, unit: &mut F) -> Result<T>
where
    T: Send,
    F: for<'c> FnMut(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T>> + Send,
{
    let mut tx = ImmediateTx::begin(pool).await?;

    let res = match tx.conn() {
        Ok(conn) => unit(conn).await,
        Err(e) => Err(e),
    };

    match res {
        Ok(v) => {
            tx.finish("COMMIT").await.context("commit atomic unit failed")?;
            Ok(v)
        }
        Err(e) => {
            if let Err(rb) = tx.finish("ROLLBACK").await {
                warn!(error = %rb, "explicit rollback failed");
            }
            debug!(error = %e, "atomic unit rolled back");
            Err(e)
        }
    }
}

/// A pooled connection inside `BEGIN IMMEDIATE`.
///
/// Dropped before [`ImmediateTx::finish`] (the unit's future was cancelled),
/// the connection is detached from the pool and closed, which rolls the
/// transaction back instead of returning a connection with an open
/// transaction to the pool.
struct ImmediateTx {
    conn: Option<PoolConnection<Sqlite>>,
}

impl ImmediateTx {
    async fn begin(pool: &SqlitePool) -> Result<Self> {
        let mut conn = pool
            .acquire()
            .await
            .context("acquire connection for atomic unit failed")?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .context("begin atomic unit failed")?;
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| anyhow!("atomic unit already finished"))
    }

    /// Run `COMMIT` or `ROLLBACK`. On failure the connection is discarded.
    async fn finish(mut self, statement: &'static str) -> Result<()> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        match sqlx::query(statement).execute(&mut *conn).await {
            Ok(_) => Ok(()),
            Err(e) => {
                drop(conn.detach());
                Err(e).with_context(|| format!("{statement} failed"))
            }
        }
    }
}

impl Drop for ImmediateTx {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            warn!("atomic unit abandoned mid-flight; closing its connection");
            drop(conn.detach());
        }
    }
}

/// SQLITE_BUSY (5) or SQLITE_LOCKED (6), including their extended codes.
fn is_busy(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| match cause.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err
            .code()
            .and_then(|c| c.parse::<i32>().ok())
            .map(|c| matches!(c & 0xff, 5 | 6))
            .unwrap_or(false),
        _ => false,
    })
}
