//! Authentication for the geosense services.
//!
//! This crate covers the token issuance and verification flow:
//!
//! - [`password`] — bcrypt hashing and constant-time verification
//! - [`token`] — RS256 JWT minting and parsing with expiry enforcement
//! - [`Authenticator`] — registration and login over a credential store
//!
//! Tokens are signed with an RSA private key and verified against the
//! matching public key; both services verify, only the authenticator mints.

pub mod error;
pub mod password;
pub mod service;
pub mod token;

#[cfg(any(test, feature = "testutil"))]
pub mod testkeys;

pub use error::{Error, Result};
pub use service::Authenticator;
pub use token::TokenClaims;
