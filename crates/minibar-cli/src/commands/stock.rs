//! One-shot stock commands. Each prints a single `key=value` summary line,
//! or the rendered report.

use anyhow::{bail, Context, Result};
use minibar_ledger::{Ledger, Price, SaleOutcome, SupplyOutcome};
use minibar_report::ReportFormat;

pub async fn menu(ledger: &Ledger, format: ReportFormat) -> Result<()> {
    let entries = ledger.list_available().await?;
    println!("{}", minibar_report::render_menu(&entries, format)?);
    Ok(())
}

pub async fn log(ledger: &Ledger, format: ReportFormat) -> Result<()> {
    let ops = ledger.list_operations().await?;
    println!("{}", minibar_report::render_log(&ops, format)?);
    Ok(())
}

/// A declined sale is a non-zero exit so scripts can branch on it.
pub async fn sell(ledger: &Ledger, name: &str, amount: i64) -> Result<()> {
    match ledger.sell_amount(name, amount).await? {
        SaleOutcome::Sold {
            item_id,
            name,
            amount,
            unit_price,
            remaining,
        } => {
            println!(
                "sold=true item_id={item_id} name={name} amount={amount} unit_price={unit_price} remaining={remaining}"
            );
            Ok(())
        }
        SaleOutcome::NoSuchDrink { name } => bail!("there is no such drink: {name}"),
        SaleOutcome::InsufficientStock {
            name,
            requested,
            available,
        } => bail!("there is no more this drink: {name} (requested {requested}, available {available})"),
    }
}

pub async fn supply(ledger: &Ledger, name: &str, amount: i64, price: &str) -> Result<()> {
    let price: Price = price
        .parse()
        .with_context(|| format!("invalid price '{price}'"))?;
    let outcome = ledger.supply(name, amount, price).await?;
    let created = matches!(outcome, SupplyOutcome::Created { .. });
    println!(
        "supplied=true item_id={} name={} created={} quantity={} price={}",
        outcome.item_id(),
        outcome.name(),
        created,
        outcome.quantity(),
        price
    );
    Ok(())
}
