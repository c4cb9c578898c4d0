//! Presentation of ledger query results.
//!
//! Two views, "Menu" and "Operation logs", each renderable as framed text,
//! HTML, or JSON. Inputs are the plain ordered sequences the ledger returns;
//! nothing here touches storage.

use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use minibar_schemas::{MenuEntry, OperationKind, OperationRecord};

mod table;

pub use table::{escape_html, Align, Table};

pub const MENU_TITLE: &str = "Menu";
pub const LOG_TITLE: &str = "Operation logs";

/// Log timestamp layout (UTC).
pub const LOG_TS_FORMAT: &str = "%m/%d/%Y, %H:%M:%S";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Html,
    Json,
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "html" => Ok(ReportFormat::Html),
            "json" => Ok(ReportFormat::Json),
            other => Err(anyhow!(
                "invalid report format '{}'. expected one of: text | html | json",
                other
            )),
        }
    }
}

/// Menu view: Drink / Quantity / Price, sorted by drink name.
pub fn menu_table(entries: &[MenuEntry]) -> Table {
    let mut sorted: Vec<&MenuEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut t = Table::new(MENU_TITLE)
        .column("Drink", Align::Left)
        .column("Quantity", Align::Right)
        .column("Price", Align::Center);
    for e in sorted {
        t.push_row(vec![e.name.clone(), e.quantity.to_string(), e.price.to_string()]);
    }
    t
}

fn operation_label(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Sale => "sale",
        OperationKind::Supply => "supply",
    }
}

/// Operation log view, insertion order as given.
pub fn log_table(ops: &[OperationRecord]) -> Table {
    let mut t = Table::new(LOG_TITLE)
        .column("#", Align::Center)
        .column("Date", Align::Center)
        .column("Drink id", Align::Center)
        .column("Drink", Align::Left)
        .column("Operation", Align::Left)
        .column("Amount", Align::Right)
        .column("Price", Align::Center);
    for op in ops {
        t.push_row(vec![
            op.id.to_string(),
            op.ts_utc.format(LOG_TS_FORMAT).to_string(),
            op.stock_item_id.to_string(),
            op.stock_item_name.clone(),
            operation_label(op.kind).to_string(),
            op.amount.to_string(),
            op.unit_price.to_string(),
        ]);
    }
    t
}

pub fn render_menu(entries: &[MenuEntry], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(menu_table(entries).to_text()),
        ReportFormat::Html => Ok(menu_table(entries).to_html()),
        ReportFormat::Json => {
            serde_json::to_string_pretty(entries).context("menu json serialize failed")
        }
    }
}

pub fn render_log(ops: &[OperationRecord], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(log_table(ops).to_text()),
        ReportFormat::Html => Ok(log_table(ops).to_html()),
        ReportFormat::Json => serde_json::to_string_pretty(ops).context("log json serialize failed"),
    }
}
