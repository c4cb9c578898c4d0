/// Store failures callers are expected to branch on.
///
/// They travel inside `anyhow::Error`; use [`store_error`] to recover the
/// typed value. Everything else (IO, decode, SQL) is an opaque storage fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No stock item with the given id.
    NotFound { id: i64 },
    /// `stock_items.name` uniqueness backstop fired.
    DuplicateName { name: String },
    /// The `quantity >= 0` check rejected an adjustment.
    NegativeQuantity { id: i64 },
    /// The store could not be opened.
    Unavailable { reason: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "stock item not found: id={id}"),
            Self::DuplicateName { name } => {
                write!(f, "stock item name already exists: {name}")
            }
            Self::NegativeQuantity { id } => {
                write!(f, "quantity would go negative for stock item id={id}")
            }
            Self::Unavailable { reason } => write!(f, "storage unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Find a [`StoreError`] anywhere in an error's context chain.
pub fn store_error(err: &anyhow::Error) -> Option<&StoreError> {
    err.chain().find_map(|cause| cause.downcast_ref::<StoreError>())
}
