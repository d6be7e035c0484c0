//! HTTP REST services for geosense.
//!
//! Two services share this crate:
//!
//! - `geosense-authd` — registration and login, issuing RS256 tokens
//! - `geosense-sensord` — sensor-metadata CRUD and geo-proximity lookup
//!
//! # REST API
//!
//! Authenticator:
//! - `POST /login` — issue a token for valid credentials
//! - `POST /register` — create a user (ADMIN only)
//!
//! Sensor metadata:
//! - `GET /{id}`, `GET /by-name/{name}` — lookups (open)
//! - `GET /nearest/{lat}/{lon}`, `GET /nearest-by-name/{location}` —
//!   proximity lookups (open)
//! - `POST /` (explicit coordinates), `POST /sensor` (place name),
//!   `PUT /{id}`, `DELETE /{id}` — writes (ADMIN only)
//!
//! Tokens travel in `Authorization: token <jwt>` or a `token` query
//! parameter. Error bodies are always `{"message": "..."}`.
//!
//! # Configuration
//!
//! All configuration comes from the environment at startup (see
//! [`config`]); `--bind`, `--mongo-uri`, and `--mongo-db` CLI flags
//! override it.

pub mod api;
pub mod config;
pub mod geocode;
pub mod middleware;
pub mod sensors;

pub use config::{AuthConfig, ConfigError, SensorConfig};
pub use geocode::{GeocodeError, Geocoder, MapboxGeocoder};
pub use middleware::TokenVerifier;
pub use sensors::{SensorMetadata, SensorMetadataService, SensorMetadataWithLocationName};
