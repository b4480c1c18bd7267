use crate::catalog::QueryId;
use crate::store::StoreError;

/// Everything a reasoner operation can fail with.
///
/// `UnsupportedConstruct` and `NotFound` are recoverable signals for the
/// caller ("operator not applicable here"). `StoreUnavailable` is the
/// driver's error, passed through untouched. `Configuration` means the
/// catalog was wired wrong and is not worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum ReasonerError {
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),
    #[error("no node found for individual <{0}>")]
    NotFound(String),
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
    #[error("query template `{0}` is not registered in the catalog")]
    Configuration(QueryId),
    #[error("identifier {0:?} cannot be used as a Cypher label or key")]
    InvalidIdentifier(String),
    #[error("unexpected value in column `{column}`: expected {expected}, got {actual}")]
    UnexpectedValue {
        column: String,
        expected: String,
        actual: String,
    },
}

impl ReasonerError {
    pub fn unsupported(what: impl Into<String>) -> Self {
        ReasonerError::UnsupportedConstruct(what.into())
    }

    /// Whether the caller can treat this as "not applicable" and move on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReasonerError::UnsupportedConstruct(_) | ReasonerError::NotFound(_)
        )
    }
}

pub type Result<T, E = ReasonerError> = std::result::Result<T, E>;
