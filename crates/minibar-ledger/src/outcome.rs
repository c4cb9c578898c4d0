use minibar_schemas::Price;

/// Result of a sale attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleOutcome {
    /// Stock decremented and a `Sale` row logged.
    Sold {
        item_id: i64,
        name: String,
        amount: i64,
        unit_price: Price,
        /// On-hand count after the sale.
        remaining: i64,
    },
    /// No item with that name has ever been supplied. Nothing written.
    NoSuchDrink { name: String },
    /// The item exists but holds fewer than `requested` units. Nothing written.
    InsufficientStock {
        name: String,
        requested: i64,
        available: i64,
    },
}

impl SaleOutcome {
    pub fn is_sold(&self) -> bool {
        matches!(self, SaleOutcome::Sold { .. })
    }
}

/// Result of a supply. Both variants logged a `Supply` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplyOutcome {
    /// First supply of this name: a new stock item was created.
    Created {
        item_id: i64,
        name: String,
        quantity: i64,
        price: Price,
    },
    /// Existing item restocked; both prices now equal `price`.
    Restocked {
        item_id: i64,
        name: String,
        /// On-hand count after the supply.
        quantity: i64,
        price: Price,
    },
}

impl SupplyOutcome {
    pub fn item_id(&self) -> i64 {
        match self {
            SupplyOutcome::Created { item_id, .. } | SupplyOutcome::Restocked { item_id, .. } => {
                *item_id
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SupplyOutcome::Created { name, .. } | SupplyOutcome::Restocked { name, .. } => name,
        }
    }

    pub fn quantity(&self) -> i64 {
        match self {
            SupplyOutcome::Created { quantity, .. }
            | SupplyOutcome::Restocked { quantity, .. } => *quantity,
        }
    }
}
