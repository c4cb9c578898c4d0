//! Ledger façade over the storage engine.
//!
//! # Atomicity
//! `sell_amount` and `supply` each execute inside one
//! [`minibar_db::run_atomic`] unit. Lookup, check, stock mutation and log
//! append commit together or not at all, so the stock table and the
//! operation log can never disagree.
//!
//! # Concurrency
//! Each unit holds the store's write lock from its first read, so concurrent
//! sales and supplies queue behind each other instead of failing. Quantity
//! updates are still relative and storage still enforces `quantity >= 0`: a
//! sale whose decrement trips that check is rolled back and reported as
//! [`SaleOutcome::InsufficientStock`].

use anyhow::anyhow;
use chrono::Utc;
use minibar_db::{store_error, StoreError};
use minibar_schemas::{MenuEntry, NewOperation, OperationKind, OperationRecord, Price};
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::{LedgerError, SaleOutcome, SupplyOutcome};

/// Where an injected fault aborts an atomic unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FaultPoint {
    /// After the stock row changed, before the log row is appended.
    AfterStockMutation,
    /// A sale's item is emptied between the stock check and the decrement,
    /// as a writer outside the unit would.
    StockDrainedAfterCheck,
}

#[derive(Clone, Debug)]
pub struct Ledger {
    pool: SqlitePool,
    fault: Option<FaultPoint>,
}

impl Ledger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, fault: None }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fail every mutating unit at `point`. Test builds only.
    #[cfg(any(test, feature = "testkit"))]
    pub fn with_fault(mut self, point: FaultPoint) -> Self {
        self.fault = Some(point);
        self
    }

    /// Sell one unit of `name`.
    pub async fn sell(&self, name: &str) -> Result<SaleOutcome, LedgerError> {
        self.sell_amount(name, 1).await
    }

    /// Sell `amount` units of `name` at its current selling price.
    pub async fn sell_amount(&self, name: &str, amount: i64) -> Result<SaleOutcome, LedgerError> {
        validate_name(name)?;
        if amount <= 0 {
            return Err(LedgerError::invalid(format!(
                "sale amount must be > 0, got {amount}"
            )));
        }

        let fault = self.fault;
        let owned = name.to_string();
        let res = minibar_db::run_atomic(&self.pool, move |conn| {
            let name = owned.clone();
            Box::pin(async move { sell_unit(conn, &name, amount, fault).await })
        })
        .await;

        match res {
            Ok(outcome) => {
                match &outcome {
                    SaleOutcome::Sold {
                        item_id,
                        remaining,
                        unit_price,
                        ..
                    } => info!(name, item_id, amount, %unit_price, remaining, "sale recorded"),
                    other => debug!(name, amount, outcome = ?other, "sale declined"),
                }
                Ok(outcome)
            }
            Err(e) => {
                let lost_race = matches!(
                    store_error(&e),
                    Some(StoreError::NegativeQuantity { .. })
                );
                if !lost_race {
                    return Err(classify(e));
                }
                // The unit rolled back; report what is left now.
                warn!(name, amount, "sale decrement hit the stock floor; unit rolled back");
                let available = minibar_db::find_item_by_name(&self.pool, name)
                    .await
                    .map_err(LedgerError::Storage)?
                    .map(|item| item.quantity)
                    .unwrap_or(0);
                Ok(SaleOutcome::InsufficientStock {
                    name: name.to_string(),
                    requested: amount,
                    available,
                })
            }
        }
    }

    /// Receive `amount` units of `name` at unit `price`.
    ///
    /// Unknown names are created; known names are restocked and both prices
    /// are overwritten with `price` (last write wins, never averaged).
    pub async fn supply(
        &self,
        name: &str,
        amount: i64,
        price: Price,
    ) -> Result<SupplyOutcome, LedgerError> {
        validate_name(name)?;
        if amount <= 0 {
            return Err(LedgerError::invalid(format!(
                "supply amount must be > 0, got {amount}"
            )));
        }

        let fault = self.fault;
        let owned = name.to_string();
        let outcome = minibar_db::run_atomic(&self.pool, move |conn| {
            let name = owned.clone();
            Box::pin(async move { supply_unit(conn, &name, amount, price, fault).await })
        })
        .await
        .map_err(classify)?;

        info!(
            name,
            item_id = outcome.item_id(),
            amount,
            %price,
            quantity = outcome.quantity(),
            created = matches!(outcome, SupplyOutcome::Created { .. }),
            "supply recorded"
        );
        Ok(outcome)
    }

    /// Items with stock on hand, ordered by name.
    pub async fn list_available(&self) -> Result<Vec<MenuEntry>, LedgerError> {
        let items = minibar_db::list_items_with_positive_quantity(&self.pool)
            .await
            .map_err(LedgerError::Storage)?;
        Ok(items.into_iter().map(MenuEntry::from).collect())
    }

    /// Full operation history in insertion order.
    pub async fn list_operations(&self) -> Result<Vec<OperationRecord>, LedgerError> {
        minibar_db::list_operations(&self.pool)
            .await
            .map_err(LedgerError::Storage)
    }
}

fn validate_name(name: &str) -> Result<(), LedgerError> {
    if name.trim().is_empty() {
        return Err(LedgerError::invalid("drink name must not be empty"));
    }
    Ok(())
}

fn trip(fault: Option<FaultPoint>, at: FaultPoint) -> anyhow::Result<()> {
    if fault == Some(at) {
        return Err(anyhow!("injected fault at {at:?}"));
    }
    Ok(())
}

/// Map a failed unit to the caller-facing error.
fn classify(e: anyhow::Error) -> LedgerError {
    if let Some(StoreError::DuplicateName { name }) = store_error(&e) {
        return LedgerError::DuplicateName { name: name.clone() };
    }
    match e.downcast::<LedgerError>() {
        Ok(ledger_err) => ledger_err,
        Err(e) => LedgerError::Storage(e),
    }
}

async fn sell_unit(
    conn: &mut SqliteConnection,
    name: &str,
    amount: i64,
    fault: Option<FaultPoint>,
) -> anyhow::Result<SaleOutcome> {
    let Some(item) = minibar_db::find_item_by_name(&mut *conn, name).await? else {
        return Ok(SaleOutcome::NoSuchDrink {
            name: name.to_string(),
        });
    };

    if amount > item.quantity {
        return Ok(SaleOutcome::InsufficientStock {
            name: item.name,
            requested: amount,
            available: item.quantity,
        });
    }

    if fault == Some(FaultPoint::StockDrainedAfterCheck) {
        minibar_db::adjust_item_quantity_and_price(
            &mut *conn,
            item.id,
            -item.quantity,
            item.selling_price,
            item.purchase_price,
        )
        .await?;
    }

    minibar_db::adjust_item_quantity_and_price(
        &mut *conn,
        item.id,
        -amount,
        item.selling_price,
        item.purchase_price,
    )
    .await?;

    trip(fault, FaultPoint::AfterStockMutation)?;

    minibar_db::append_operation(
        &mut *conn,
        &NewOperation {
            ts_utc: Utc::now(),
            stock_item_id: item.id,
            stock_item_name: item.name.clone(),
            kind: OperationKind::Sale,
            amount,
            unit_price: item.selling_price,
        },
    )
    .await?;

    Ok(SaleOutcome::Sold {
        item_id: item.id,
        name: item.name,
        amount,
        unit_price: item.selling_price,
        remaining: item.quantity - amount,
    })
}

async fn supply_unit(
    conn: &mut SqliteConnection,
    name: &str,
    amount: i64,
    price: Price,
    fault: Option<FaultPoint>,
) -> anyhow::Result<SupplyOutcome> {
    let outcome = match minibar_db::find_item_by_name(&mut *conn, name).await? {
        None => {
            let item_id = minibar_db::insert_item(&mut *conn, name, amount, price).await?;
            SupplyOutcome::Created {
                item_id,
                name: name.to_string(),
                quantity: amount,
                price,
            }
        }
        Some(item) => {
            let quantity = item.quantity.checked_add(amount).ok_or_else(|| {
                LedgerError::invalid(format!(
                    "supply of {amount} would overflow quantity of {}",
                    item.name
                ))
            })?;
            minibar_db::adjust_item_quantity_and_price(&mut *conn, item.id, amount, price, price)
                .await?;
            SupplyOutcome::Restocked {
                item_id: item.id,
                name: item.name,
                quantity,
                price,
            }
        }
    };

    trip(fault, FaultPoint::AfterStockMutation)?;

    minibar_db::append_operation(
        &mut *conn,
        &NewOperation {
            ts_utc: Utc::now(),
            stock_item_id: outcome.item_id(),
            stock_item_name: outcome.name().to_string(),
            kind: OperationKind::Supply,
            amount,
            unit_price: price,
        },
    )
    .await?;

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minibar_db::{StorageSettings, MEMORY_URL};

    async fn fresh_ledger() -> Ledger {
        let pool = minibar_db::connect(MEMORY_URL, &StorageSettings::default())
            .await
            .unwrap();
        minibar_db::migrate(&pool).await.unwrap();
        Ledger::new(pool)
    }

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_storage_access() {
        // Deliberately not migrated: any storage access would fail with a
        // missing-table error instead of InvalidInput.
        let pool = minibar_db::connect(MEMORY_URL, &StorageSettings::default())
            .await
            .unwrap();
        let ledger = Ledger::new(pool);

        for res in [
            ledger.sell_amount("vodka", 0).await,
            ledger.sell_amount("vodka", -3).await,
            ledger.sell("   ").await,
        ] {
            assert!(matches!(res, Err(LedgerError::InvalidInput { .. })), "{res:?}");
        }
        for res in [
            ledger.supply("vodka", 0, price("1")).await,
            ledger.supply("", 1, price("1")).await,
        ] {
            assert!(matches!(res, Err(LedgerError::InvalidInput { .. })), "{res:?}");
        }
    }

    #[tokio::test]
    async fn fault_after_sale_mutation_rolls_back_stock() {
        let ledger = fresh_ledger().await;
        ledger.supply("vodka", 4, price("40.9")).await.unwrap();

        let faulty = ledger.clone().with_fault(FaultPoint::AfterStockMutation);
        let res = faulty.sell("vodka").await;
        assert!(matches!(res, Err(LedgerError::Storage(_))), "{res:?}");

        let menu = ledger.list_available().await.unwrap();
        assert_eq!(menu[0].quantity, 4, "decrement must not survive the fault");
        assert_eq!(ledger.list_operations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fault_after_first_supply_leaves_no_item_row() {
        let ledger = fresh_ledger().await;
        let faulty = ledger.clone().with_fault(FaultPoint::AfterStockMutation);

        assert!(faulty.supply("rum", 2, price("20")).await.is_err());

        assert!(minibar_db::find_item_by_name(ledger.pool(), "rum")
            .await
            .unwrap()
            .is_none());
        assert!(ledger.list_operations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fault_after_restock_keeps_old_quantity_and_price() {
        let ledger = fresh_ledger().await;
        ledger.supply("rum", 2, price("20")).await.unwrap();

        let faulty = ledger.clone().with_fault(FaultPoint::AfterStockMutation);
        assert!(faulty.supply("rum", 5, price("25")).await.is_err());

        let item = minibar_db::find_item_by_name(ledger.pool(), "rum")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.quantity, 2);
        assert_eq!(item.selling_price, price("20"));
        assert_eq!(item.purchase_price, price("20"));
        assert_eq!(ledger.list_operations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn decrement_below_zero_inside_sale_becomes_insufficient_stock() {
        let ledger = fresh_ledger().await;
        ledger.supply("absent", 4, price("300.4")).await.unwrap();

        let faulty = ledger.clone().with_fault(FaultPoint::StockDrainedAfterCheck);
        let out = faulty.sell_amount("absent", 2).await.unwrap();
        assert_eq!(
            out,
            SaleOutcome::InsufficientStock {
                name: "absent".to_string(),
                requested: 2,
                available: 4,
            }
        );

        // The drain and the failed decrement rolled back together.
        let item = minibar_db::find_item_by_name(ledger.pool(), "absent")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.quantity, 4);
        assert_eq!(ledger.list_operations().await.unwrap().len(), 1);

        // Supplies are unaffected by a sale-only fault.
        assert!(faulty.supply("absent", 1, price("300.4")).await.is_ok());
    }

    #[tokio::test]
    async fn restock_overflow_is_invalid_input_and_changes_nothing() {
        let ledger = fresh_ledger().await;
        ledger.supply("water", i64::MAX, price("1")).await.unwrap();

        let res = ledger.supply("water", 1, price("2")).await;
        assert!(matches!(res, Err(LedgerError::InvalidInput { .. })), "{res:?}");
        assert_eq!(ledger.list_operations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sale_uses_current_selling_price_and_keeps_prices() {
        let ledger = fresh_ledger().await;
        ledger.supply("wine", 10, price("85.3")).await.unwrap();

        let out = ledger.sell_amount("wine", 3).await.unwrap();
        assert_eq!(
            out,
            SaleOutcome::Sold {
                item_id: 1,
                name: "wine".to_string(),
                amount: 3,
                unit_price: price("85.3"),
                remaining: 7,
            }
        );
        let item = minibar_db::find_item_by_name(ledger.pool(), "wine")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.selling_price, price("85.3"));
        assert_eq!(item.purchase_price, price("85.3"));
    }
}
