//! Registration and login over a credential store.

use std::sync::Arc;

use jsonwebtoken::EncodingKey;
use time::Duration;
use tracing::debug;

use geosense_store::{Credential, CredentialStore};
use geosense_types::Role;

use crate::error::{Error, Result};
use crate::{password, token};

/// Orchestrates registration (hash + persist) and login (verify + issue).
pub struct Authenticator {
    credentials: Arc<dyn CredentialStore>,
    signing_key: EncodingKey,
    token_ttl: Duration,
}

impl Authenticator {
    /// Build an authenticator from a credential store and an RSA private
    /// key in PEM form.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        private_key_pem: &[u8],
        token_ttl: Duration,
    ) -> Result<Self> {
        Ok(Self {
            credentials,
            signing_key: token::encoding_key_from_pem(private_key_pem)?,
            token_ttl,
        })
    }

    /// Register a new user. Fails with [`Error::DuplicateUsername`] if the
    /// username is taken; the second credential is never persisted.
    pub async fn register(&self, username: &str, plain_password: &str, role: Role) -> Result<()> {
        let password_hash = password::hash(plain_password)?;
        self.credentials
            .add(Credential {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await
            .map_err(|err| match err {
                geosense_store::Error::DuplicateUsername => Error::DuplicateUsername,
                other => Error::Store(other),
            })?;
        debug!(username, %role, "registered user");
        Ok(())
    }

    /// Verify a password and issue a signed token carrying the stored
    /// username and role.
    ///
    /// Unknown usernames and wrong passwords both surface as
    /// [`Error::InvalidCredentials`] so the response cannot be used to probe
    /// which usernames exist.
    pub async fn login(&self, username: &str, plain_password: &str) -> Result<String> {
        let credential = self
            .credentials
            .find_by_username(username)
            .await
            .map_err(|err| match err {
                geosense_store::Error::CredentialNotFound => Error::InvalidCredentials,
                other => Error::Store(other),
            })?;

        if !password::verify(plain_password, &credential.password_hash)? {
            return Err(Error::InvalidCredentials);
        }

        token::mint(
            &self.signing_key,
            &credential.username,
            credential.role,
            self.token_ttl,
        )
    }
}
