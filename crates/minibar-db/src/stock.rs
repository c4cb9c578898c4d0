use anyhow::{Context, Result};
use minibar_schemas::{NewOperation, OperationKind, OperationRecord, Price, StockItem};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};

use crate::StoreError;

fn item_from_row(row: &SqliteRow) -> Result<StockItem> {
    Ok(StockItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        quantity: row.try_get("quantity")?,
        selling_price: Price::from_micros(row.try_get("selling_price_micros")?)?,
        purchase_price: Price::from_micros(row.try_get("purchase_price_micros")?)?,
    })
}

fn operation_from_row(row: &SqliteRow) -> Result<OperationRecord> {
    Ok(OperationRecord {
        id: row.try_get("id")?,
        ts_utc: row.try_get("ts_utc")?,
        stock_item_id: row.try_get("stock_item_id")?,
        stock_item_name: row.try_get("stock_item_name")?,
        kind: OperationKind::parse(&row.try_get::<String, _>("kind")?)?,
        amount: row.try_get("amount")?,
        unit_price: Price::from_micros(row.try_get("unit_price_micros")?)?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn is_check_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_check_violation())
}

/// Exact, case-sensitive lookup. `None` when no such item exists.
pub async fn find_item_by_name<'c, E>(ex: E, name: &str) -> Result<Option<StockItem>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        select id, name, quantity, selling_price_micros, purchase_price_micros
        from stock_items
        where name = ?1
        "#,
    )
    .bind(name)
    .fetch_optional(ex)
    .await
    .context("find_item_by_name failed")?;

    row.as_ref().map(item_from_row).transpose()
}

/// Insert a new item with both prices set to `price`; returns the new id.
///
/// Callers check existence first; the unique constraint is a backstop that
/// surfaces as [`StoreError::DuplicateName`].
pub async fn insert_item<'c, E>(ex: E, name: &str, quantity: i64, price: Price) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query(
        r#"
        insert into stock_items (name, quantity, selling_price_micros, purchase_price_micros)
        values (?1, ?2, ?3, ?3)
        "#,
    )
    .bind(name)
    .bind(quantity)
    .bind(price.micros())
    .execute(ex)
    .await;

    match res {
        Ok(done) => Ok(done.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateName {
            name: name.to_string(),
        }
        .into()),
        Err(e) => Err(anyhow::Error::new(e).context("insert_item failed")),
    }
}

/// Add `delta_quantity` (may be negative) to the item's quantity and overwrite
/// both prices.
///
/// The update is relative (`quantity = quantity + delta`), so it never loses a
/// concurrent committed change; the `quantity >= 0` check turns an oversell
/// into [`StoreError::NegativeQuantity`].
pub async fn adjust_item_quantity_and_price<'c, E>(
    ex: E,
    id: i64,
    delta_quantity: i64,
    selling_price: Price,
    purchase_price: Price,
) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    let res = sqlx::query(
        r#"
        update stock_items
        set quantity = quantity + ?2,
            selling_price_micros = ?3,
            purchase_price_micros = ?4
        where id = ?1
        "#,
    )
    .bind(id)
    .bind(delta_quantity)
    .bind(selling_price.micros())
    .bind(purchase_price.micros())
    .execute(ex)
    .await;

    match res {
        Ok(done) if done.rows_affected() == 0 => Err(StoreError::NotFound { id }.into()),
        Ok(_) => Ok(()),
        Err(e) if is_check_violation(&e) => Err(StoreError::NegativeQuantity { id }.into()),
        Err(e) => Err(anyhow::Error::new(e).context("adjust_item_quantity_and_price failed")),
    }
}

/// Append one log row; returns its sequence id.
///
/// The row is only written if the referenced item exists, otherwise
/// [`StoreError::NotFound`].
pub async fn append_operation<'c, E>(ex: E, op: &NewOperation) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let done = sqlx::query(
        r#"
        insert into operations (
          ts_utc, stock_item_id, stock_item_name, kind, amount, unit_price_micros
        )
        select ?1, id, ?3, ?4, ?5, ?6
        from stock_items
        where id = ?2
        "#,
    )
    .bind(op.ts_utc)
    .bind(op.stock_item_id)
    .bind(&op.stock_item_name)
    .bind(op.kind.as_str())
    .bind(op.amount)
    .bind(op.unit_price.micros())
    .execute(ex)
    .await
    .context("append_operation failed")?;

    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            id: op.stock_item_id,
        }
        .into());
    }
    Ok(done.last_insert_rowid())
}

/// Items with stock on hand, ordered by name (binary collation, ascending).
pub async fn list_items_with_positive_quantity<'c, E>(ex: E) -> Result<Vec<StockItem>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        select id, name, quantity, selling_price_micros, purchase_price_micros
        from stock_items
        where quantity > 0
        order by name asc
        "#,
    )
    .fetch_all(ex)
    .await
    .context("list_items_with_positive_quantity failed")?;

    rows.iter().map(item_from_row).collect()
}

/// Full operation history in insertion order.
pub async fn list_operations<'c, E>(ex: E) -> Result<Vec<OperationRecord>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let rows = sqlx::query(
        r#"
        select id, ts_utc, stock_item_id, stock_item_name, kind, amount, unit_price_micros
        from operations
        order by id asc
        "#,
    )
    .fetch_all(ex)
    .await
    .context("list_operations failed")?;

    rows.iter().map(operation_from_row).collect()
}
