//! Shared record types for the bar ledger.
//!
//! These are plain data: the storage engine produces them, the ledger returns
//! them, and renderers consume them without touching storage.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod price;

pub use price::{Price, MICROS_SCALE};

/// A tracked drink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    /// Assigned by storage on first insert; never reused.
    pub id: i64,
    /// Case-sensitive unique label, the only external lookup key.
    pub name: String,
    /// Count on hand, always >= 0.
    pub quantity: i64,
    pub selling_price: Price,
    pub purchase_price: Price,
}

/// Kind of stock movement recorded in the operation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    Sale,
    Supply,
}

impl OperationKind {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Sale => "SALE",
            OperationKind::Supply => "SUPPLY",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "SALE" => Ok(OperationKind::Sale),
            "SUPPLY" => Ok(OperationKind::Supply),
            other => Err(anyhow!("invalid operation kind: {}", other)),
        }
    }
}

/// One immutable operation log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Storage sequence number; ascending ids are insertion order.
    pub id: i64,
    pub ts_utc: DateTime<Utc>,
    pub stock_item_id: i64,
    /// Snapshot of the item name at operation time.
    pub stock_item_name: String,
    pub kind: OperationKind,
    /// Units moved, always > 0.
    pub amount: i64,
    pub unit_price: Price,
}

/// Operation about to be appended; id is assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOperation {
    pub ts_utc: DateTime<Utc>,
    pub stock_item_id: i64,
    pub stock_item_name: String,
    pub kind: OperationKind,
    pub amount: i64,
    pub unit_price: Price,
}

/// A row of the menu: an item with stock on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub name: String,
    pub quantity: i64,
    /// Current selling price.
    pub price: Price,
}

impl From<StockItem> for MenuEntry {
    fn from(item: StockItem) -> Self {
        MenuEntry {
            name: item.name,
            quantity: item.quantity,
            price: item.selling_price,
        }
    }
}
