//! Document-store persistence for geosense.
//!
//! This crate provides the storage layer for both services: a credential
//! store for the authenticator and a sensor-metadata store with geospatial
//! lookup. Each store is an async trait with two implementations:
//!
//! - a MongoDB-backed store used in production, and
//! - an in-memory double (in [`memory`]) used by unit tests so that the
//!   service layers can be exercised without a live database.
//!
//! The sensor store maintains a derived GeoJSON point (`[lon, lat]`, the
//! convention of the 2dsphere index) that is recomputed on every write and
//! never mutated independently of the location it was derived from.

pub mod credentials;
pub mod error;
pub mod memory;
pub mod models;
pub mod sensors;

pub use credentials::{CredentialStore, MongoCredentialStore};
pub use error::{Error, Result};
pub use models::{Credential, GeoPoint, SensorRecord};
pub use sensors::{MongoSensorStore, SensorStore};

// Sensor and credential ids are the store's ObjectIds; callers translate
// to and from the hex wire form at the service boundary.
pub use mongodb::bson::oid::ObjectId;
