//! Scenario: concurrent sales racing for the last unit.
//!
//! Several ledgers share one file-backed store through a multi-connection
//! pool. Exactly one sale may win; every other caller sees
//! `InsufficientStock`, and the log holds exactly one sale. With stock for
//! every caller, every sale waits for the write lock and succeeds.

use futures_util::future::join_all;
use minibar_ledger::{Ledger, OperationKind, SaleOutcome};
use minibar_testkit::{file_pool, item, price};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn last_unit_is_sold_once() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let pool = file_pool(dir.path(), 4).await?;
    let ledger = Ledger::new(pool.clone());
    ledger.supply("absent", 1, price("300.4")).await?;

    let tasks = (0..6).map(|_| {
        let ledger = ledger.clone();
        tokio::spawn(async move { ledger.sell("absent").await })
    });
    let results = join_all(tasks).await;

    let mut sold = 0;
    for joined in results {
        match joined?? {
            SaleOutcome::Sold { remaining, .. } => {
                assert_eq!(remaining, 0);
                sold += 1;
            }
            SaleOutcome::InsufficientStock { available, .. } => assert_eq!(available, 0),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(sold, 1);

    assert_eq!(item(&pool, "absent").await?.map(|i| i.quantity), Some(0));
    let sales = ledger
        .list_operations()
        .await?
        .into_iter()
        .filter(|op| op.kind == OperationKind::Sale)
        .count();
    assert_eq!(sales, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_restocks_add_up() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let pool = file_pool(dir.path(), 4).await?;
    let ledger = Ledger::new(pool.clone());
    ledger.supply("wine", 1, price("85.3")).await?;

    let tasks = (0..4).map(|_| {
        let ledger = ledger.clone();
        tokio::spawn(async move { ledger.supply("wine", 2, price("85.3")).await })
    });
    for joined in join_all(tasks).await {
        joined??;
    }

    assert_eq!(item(&pool, "wine").await?.map(|i| i.quantity), Some(9));
    assert_eq!(ledger.list_operations().await?.len(), 5);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn every_caller_is_served_while_stock_lasts() -> anyhow::Result<()> {
    const CALLERS: i64 = 64;

    let dir = tempfile::tempdir()?;
    let pool = file_pool(dir.path(), 8).await?;
    let ledger = Ledger::new(pool.clone());
    ledger.supply("absent", CALLERS, price("1")).await?;

    let tasks = (0..CALLERS).map(|_| {
        let ledger = ledger.clone();
        tokio::spawn(async move { ledger.sell("absent").await })
    });

    let mut sold = 0;
    for joined in join_all(tasks).await {
        let outcome = joined??;
        assert!(outcome.is_sold(), "stock was on hand: {outcome:?}");
        sold += 1;
    }
    assert_eq!(sold, CALLERS);

    assert_eq!(item(&pool, "absent").await?.map(|i| i.quantity), Some(0));
    let sales = ledger
        .list_operations()
        .await?
        .into_iter()
        .filter(|op| op.kind == OperationKind::Sale)
        .count();
    assert_eq!(sales as i64, CALLERS);
    assert!(matches!(
        ledger.sell("absent").await?,
        SaleOutcome::InsufficientStock { available: 0, .. }
    ));
    Ok(())
}
