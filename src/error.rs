use crate::schema::UnknownStatus;
use thiserror::Error;

/// A store operation could not complete. The worker treats this as
/// "try again next tick"; ingestion surfaces it to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    BadStatus(#[from] UnknownStatus),
}

#[derive(Debug, Error)]
pub enum IngestError {
    /// Usage error, not a system fault: every row lacked a name or an
    /// email, so there was nothing to write.
    #[error("no valid leads found; check the CSV headers (name and email required)")]
    NoValidRows,

    #[error("failed to parse csv: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
