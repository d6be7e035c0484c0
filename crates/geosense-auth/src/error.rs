//! Error types for geosense-auth.

/// Result type for geosense-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in geosense-auth.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown username or wrong password. Collapsed into one variant so a
    /// login failure never reveals which of the two was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration attempted with a username that is already taken.
    #[error("username already taken")]
    DuplicateUsername,

    /// The token's signature does not match the verification key.
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// The token's expiry has passed.
    #[error("token has expired")]
    Expired,

    /// The token could not be decoded at all.
    #[error("malformed token")]
    Malformed,

    /// Signing failed.
    #[error("could not sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// PEM key material could not be parsed.
    #[error("invalid key material: {0}")]
    Key(#[source] jsonwebtoken::errors::Error),

    /// Password hashing failed.
    #[error("could not hash password: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    /// Underlying credential store failure.
    #[error(transparent)]
    Store(geosense_store::Error),
}
