//! Service configuration.
//!
//! Configuration is read from the environment once at startup into plain
//! structs that are passed into constructors and never mutated afterwards.
//! No component reads the environment after initialization.

use time::Duration;

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Configuration for the authenticator service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Bind address for the HTTP listener.
    pub bind: String,
    /// Document store connection URI.
    pub mongo_uri: String,
    /// Database holding the users collection.
    pub mongo_db: String,
    /// Bootstrap administrator password, hashed and inserted once.
    pub root_password: String,
    /// RSA private key (PEM) for signing tokens.
    pub private_key_pem: String,
    /// RSA public key (PEM) for verifying tokens on guarded routes.
    pub public_key_pem: String,
    /// Issued-token lifetime.
    pub token_ttl: Duration,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&|name| std::env::var(name).ok())
    }

    fn from_vars(get: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bind: var_or(get, "BIND", "0.0.0.0:4001"),
            mongo_uri: var_or(get, "MONGO_URI", "mongodb://localhost:27017"),
            mongo_db: var_or(get, "MONGO_DB", "users"),
            root_password: var_or(get, "ROOT_PASSWORD", "1234"),
            private_key_pem: required(get, "JWT_PRIVATE_KEY_PEM")?,
            public_key_pem: required(get, "JWT_PUBLIC_KEY_PEM")?,
            token_ttl: token_ttl(get)?,
        })
    }
}

/// Configuration for the sensor-metadata service.
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Bind address for the HTTP listener.
    pub bind: String,
    /// Document store connection URI.
    pub mongo_uri: String,
    /// Database holding the sensor-metadata collection.
    pub mongo_db: String,
    /// RSA public key (PEM) for verifying tokens on guarded routes.
    pub public_key_pem: String,
    /// API key for the external geocoding lookup.
    pub geocoding_api_key: String,
}

impl SensorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&|name| std::env::var(name).ok())
    }

    fn from_vars(get: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bind: var_or(get, "BIND", "0.0.0.0:4000"),
            mongo_uri: var_or(get, "MONGO_URI", "mongodb://localhost:27017"),
            mongo_db: var_or(get, "MONGO_DB", "sensors"),
            public_key_pem: required(get, "JWT_PUBLIC_KEY_PEM")?,
            geocoding_api_key: required(get, "GEOCODING_API_KEY")?,
        })
    }
}

fn var_or(get: &dyn Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    match get(name) {
        Some(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

fn required(
    get: &dyn Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    match get(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn token_ttl(get: &dyn Fn(&str) -> Option<String>) -> Result<Duration, ConfigError> {
    match get("TOKEN_TTL_SECS") {
        Some(raw) if !raw.is_empty() => {
            let secs: i64 = raw.parse().map_err(|_| ConfigError::Invalid {
                name: "TOKEN_TTL_SECS",
                message: format!("expected an integer number of seconds, got {raw:?}"),
            })?;
            if secs <= 0 {
                return Err(ConfigError::Invalid {
                    name: "TOKEN_TTL_SECS",
                    message: "must be positive".to_string(),
                });
            }
            Ok(Duration::seconds(secs))
        }
        _ => Ok(Duration::hours(1)),
    }
}
