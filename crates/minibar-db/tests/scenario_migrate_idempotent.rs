//! Schema bootstrap must be idempotent across restarts.

use minibar_db::{StorageSettings, MEMORY_URL};

#[tokio::test]
async fn migrate_twice_on_fresh_store_is_noop() -> anyhow::Result<()> {
    let pool = minibar_db::connect(MEMORY_URL, &StorageSettings::default()).await?;

    minibar_db::migrate(&pool).await?;
    minibar_db::migrate(&pool).await?;

    let st = minibar_db::status(&pool).await?;
    assert!(st.ok);
    assert!(st.has_stock_items_table);
    assert!(st.has_operations_table);
    assert_eq!(st.schema_version, Some(1));
    Ok(())
}

#[tokio::test]
async fn status_before_migrate_reports_missing_tables() -> anyhow::Result<()> {
    let pool = minibar_db::connect(MEMORY_URL, &StorageSettings::default()).await?;

    let st = minibar_db::status(&pool).await?;
    assert!(st.ok);
    assert!(!st.has_stock_items_table);
    assert!(!st.has_operations_table);
    assert_eq!(st.schema_version, None);
    Ok(())
}

#[tokio::test]
async fn file_store_survives_reopen_and_remigrate() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}", dir.path().join("bar.db").display());

    {
        let pool = minibar_db::connect(&url, &StorageSettings::default()).await?;
        minibar_db::migrate(&pool).await?;
        minibar_db::insert_item(&pool, "vodka", 4, "40.9".parse()?).await?;
        pool.close().await;
    }

    let pool = minibar_db::connect(&url, &StorageSettings::default()).await?;
    minibar_db::migrate(&pool).await?;
    let item = minibar_db::find_item_by_name(&pool, "vodka")
        .await?
        .expect("row must survive restart");
    assert_eq!(item.quantity, 4);
    Ok(())
}

#[tokio::test]
async fn external_schema_dir_bootstraps_the_same_tables() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("0001_stock_and_operations.sql"),
        include_str!("../migrations/0001_stock_and_operations.sql"),
    )?;

    let pool = minibar_db::connect(MEMORY_URL, &StorageSettings::default()).await?;
    minibar_db::migrate_from_dir(&pool, dir.path()).await?;
    minibar_db::migrate_from_dir(&pool, dir.path()).await?;

    let st = minibar_db::status(&pool).await?;
    assert!(st.has_stock_items_table && st.has_operations_table);
    assert_eq!(st.schema_version, Some(1));
    Ok(())
}

#[tokio::test]
async fn missing_schema_dir_is_an_error() -> anyhow::Result<()> {
    let pool = minibar_db::connect(MEMORY_URL, &StorageSettings::default()).await?;
    let err = minibar_db::migrate_from_dir(&pool, std::path::Path::new("/no/such/schema"))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("/no/such/schema"));
    Ok(())
}
