use thiserror::Error;

/// Error types for the ledger engine. Handlers map each variant to an
/// HTTP status and stable error code.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A request failed a semantic check (bad amount, bad percentage,
    /// missing installment count, ...). The message is user-facing.
    #[error("{0}")]
    Validation(String),

    /// The referenced record does not exist for this user. Records
    /// owned by a different user are reported identically so that
    /// ownership is never leaked.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An optimistic concurrency check failed twice in a row.
    #[error("the record was modified concurrently, retry the request")]
    Conflict,

    /// Error from the database layer.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
