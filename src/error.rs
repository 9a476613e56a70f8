use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0}")]
    Invariant(#[from] InvariantError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

/// Which allocation cap a donation write ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationKind {
    Bid,
    Ticket,
}

impl std::fmt::Display for AllocationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationKind::Bid => write!(f, "bid"),
            AllocationKind::Ticket => write!(f, "ticket"),
        }
    }
}

/// Ledger invariant violations. Always reported before anything is
/// persisted; carries enough detail to surface per-field in a UI.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantError {
    #[error("{kind} allocation total {allocated} exceeds donation amount {amount}")]
    AllocationExceedsAmount {
        kind: AllocationKind,
        allocated: Decimal,
        amount: Decimal,
    },

    #[error("donation must have a donor before leaving the pending state")]
    MissingDonor,

    #[error("donation has no usable external identifier")]
    InvalidDomainId,
}

/// Drawing failures. Returned to the caller inside a `DrawResult`, never
/// as an `Err`; persistence faults are the only `Err` path out of a draw.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrawingError {
    #[error("prize has no eligible entrants")]
    NoEligibleEntrants,

    #[error("prize already has {current} of {max} winners")]
    PrizeExhausted { current: i32, max: i32 },

    #[error("selection rejected {attempts} times, giving up")]
    SelectionRejectedRetriesExceeded { attempts: u32 },
}

/// Why a payment notification could not be applied. These are logged and
/// acknowledged, not raised; the financial state stays untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconciliationError {
    #[error("donation {domain_id} already recorded for a different event")]
    CrossEventConflict { domain_id: String },

    #[error("notification amount {got} does not match recorded amount {expected}")]
    AmountMismatch { got: Decimal, expected: Decimal },

    #[error("notification currency {got} does not match event currency {expected}")]
    CurrencyMismatch { got: String, expected: String },
}
