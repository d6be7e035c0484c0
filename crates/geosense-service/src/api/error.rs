//! HTTP error mapping shared by both services.

use axum::{Json, http::StatusCode, response::IntoResponse};
use tracing::error;

use crate::sensors::SensorServiceError;

/// Application error type. Every handler failure maps to one of these,
/// and every variant renders as `{"message": <text>}` with its status.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    /// Carries the detail for the log only; clients see a stable message.
    Internal(String),
}

impl From<geosense_auth::Error> for ApiError {
    fn from(err: geosense_auth::Error) -> Self {
        use geosense_auth::Error;
        match err {
            Error::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            Error::DuplicateUsername => ApiError::Conflict(err.to_string()),
            Error::Expired | Error::SignatureInvalid | Error::Malformed => {
                ApiError::BadRequest(err.to_string())
            }
            Error::Signing(_) | Error::Key(_) | Error::Hashing(_) | Error::Store(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<SensorServiceError> for ApiError {
    fn from(err: SensorServiceError) -> Self {
        use geosense_store::Error as StoreError;
        match err {
            SensorServiceError::InvalidCoordinate(_) | SensorServiceError::InvalidId(_) => {
                ApiError::BadRequest(err.to_string())
            }
            SensorServiceError::Store(store) => match store {
                StoreError::SensorNotFound | StoreError::CredentialNotFound => {
                    ApiError::NotFound(store.to_string())
                }
                StoreError::MissingId => ApiError::BadRequest(store.to_string()),
                StoreError::DuplicateUsername => ApiError::Conflict(store.to_string()),
                StoreError::Database(e) => ApiError::Internal(e.to_string()),
            },
            SensorServiceError::Geocode(geo) => match geo {
                crate::geocode::GeocodeError::NotFound => ApiError::NotFound(geo.to_string()),
                crate::geocode::GeocodeError::Upstream(e) => ApiError::Internal(e.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(detail) => {
                // Driver and upstream text stays out of response bodies.
                error!("internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
