//! Credential persistence.

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use tracing::{info, warn};

use geosense_types::Role;

use crate::error::{Error, Result};
use crate::models::Credential;

const USERS_COLLECTION: &str = "users";

/// Username reserved for the bootstrap administrator.
pub const ROOT_USERNAME: &str = "root";

/// Store of user credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new credential. Fails with [`Error::DuplicateUsername`] if
    /// the username is already taken.
    async fn add(&self, credential: Credential) -> Result<()>;

    /// Look up a credential by username.
    async fn find_by_username(&self, username: &str) -> Result<Credential>;
}

/// MongoDB-backed credential store.
pub struct MongoCredentialStore {
    users: Collection<Credential>,
}

impl MongoCredentialStore {
    /// Connect to the store, ensure the unique username index, and ensure
    /// the bootstrap administrator exists.
    ///
    /// `root_password_hash` is the already-hashed bootstrap password; the
    /// insert is best-effort so that a root credential created by an earlier
    /// startup (possibly with a rotated password) is never clobbered.
    pub async fn connect(uri: &str, database: &str, root_password_hash: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let users = client
            .database(database)
            .collection::<Credential>(USERS_COLLECTION);

        let index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users.create_index(index).await?;
        info!(database, "connected credential store");

        let store = Self { users };
        store.ensure_root(root_password_hash).await;
        Ok(store)
    }

    /// Idempotent "ensure root exists" bootstrap step.
    async fn ensure_root(&self, password_hash: &str) {
        let root = Credential {
            username: ROOT_USERNAME.to_string(),
            password_hash: password_hash.to_string(),
            role: Role::Admin,
        };
        match self.add(root).await {
            Ok(()) => info!("bootstrap administrator created"),
            Err(Error::DuplicateUsername) => {}
            Err(err) => warn!(%err, "could not ensure bootstrap administrator"),
        }
    }
}

#[async_trait]
impl CredentialStore for MongoCredentialStore {
    async fn add(&self, credential: Credential) -> Result<()> {
        self.users.insert_one(&credential).await.map_err(|err| {
            if Error::is_duplicate_key(&err) {
                Error::DuplicateUsername
            } else {
                Error::Database(err)
            }
        })?;
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Credential> {
        self.users
            .find_one(doc! { "username": username })
            .await?
            .ok_or(Error::CredentialNotFound)
    }
}
