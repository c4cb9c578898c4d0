/// Failures of a ledger call. None of them leave partial writes behind.
#[derive(Debug)]
pub enum LedgerError {
    /// Rejected before any storage access (empty name, non-positive amount,
    /// quantity overflow).
    InvalidInput { reason: String },
    /// The name uniqueness backstop fired inside a supply unit: another
    /// writer created the item between our lookup and insert.
    DuplicateName { name: String },
    /// Unexpected storage fault; the atomic unit was rolled back.
    Storage(anyhow::Error),
}

impl LedgerError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { reason } => write!(f, "invalid input: {reason}"),
            Self::DuplicateName { name } => {
                write!(f, "unexpected duplicate stock item name: {name}")
            }
            Self::Storage(e) => write!(f, "storage failure: {e:#}"),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
