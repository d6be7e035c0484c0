//! Shared domain types for the geosense services.
//!
//! This crate holds the small set of types that both the authentication
//! service and the sensor-metadata service agree on: geographic locations
//! and user roles. Storage documents and HTTP DTOs live in their own
//! crates; only types that cross service boundaries belong here.

pub mod types;

pub use types::{Location, ParseRoleError, Role};
