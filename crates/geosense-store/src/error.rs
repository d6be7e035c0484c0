//! Error types for geosense-store.

/// Result type for geosense-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in geosense-store.
///
/// Not-found and duplicate conditions get their own variants with stable
/// messages; driver error text is never surfaced to callers directly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying database error from the MongoDB driver.
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// A credential with the same username already exists.
    #[error("username already taken")]
    DuplicateUsername,

    /// No credential matched the requested username.
    #[error("credential not found")]
    CredentialNotFound,

    /// No sensor matched the requested id, name, or proximity query.
    #[error("sensor not found")]
    SensorNotFound,

    /// An update was attempted on a sensor that has never been persisted.
    #[error("sensor id is required for updates")]
    MissingId,
}

impl Error {
    /// Whether a driver error is a unique-index violation (E11000).
    pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
        use mongodb::error::{ErrorKind, WriteFailure};
        matches!(
            err.kind.as_ref(),
            ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
        )
    }
}
