//! minibar-ledger
//!
//! The only writer of the stock table and the operation log.
//! - `sell` / `supply` each run as one atomic unit: read, check, mutate, log.
//! - Expected conditions (no such drink, not enough stock) are typed outcomes.
//! - Stateless between calls: every operation re-reads current storage.

mod error;
mod ledger;
mod outcome;

pub use error::LedgerError;
pub use ledger::{FaultPoint, Ledger};
pub use outcome::{SaleOutcome, SupplyOutcome};

pub use minibar_schemas::{MenuEntry, OperationKind, OperationRecord, Price};
