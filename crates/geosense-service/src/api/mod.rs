//! HTTP routers for the authenticator and the sensor-metadata service.

pub mod auth;
pub mod error;
pub mod sensors;

pub use auth::{AuthState, auth_router};
pub use error::ApiError;
pub use sensors::{SensorState, sensor_router};
