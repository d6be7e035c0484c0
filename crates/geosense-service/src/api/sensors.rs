//! Sensor-metadata HTTP API.
//!
//! Reads are open; writes require an ADMIN token. The gate runs as route
//! middleware so the write handlers only see authorized requests.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tracing::info;

use crate::api::ApiError;
use crate::middleware::{TokenVerifier, require_admin};
use crate::sensors::{SensorMetadata, SensorMetadataService, SensorMetadataWithLocationName};

/// Shared state for the sensor router.
#[derive(Clone)]
pub struct SensorState {
    pub sensors: Arc<SensorMetadataService>,
    pub verifier: Arc<TokenVerifier>,
}

/// Build the sensor-metadata router.
///
/// `POST /sensor` creates a sensor from a place name instead of explicit
/// coordinates; it is guarded the same way as `POST /`.
pub fn sensor_router(state: SensorState) -> Router {
    let writes = Router::new()
        .route("/", post(add))
        .route("/sensor", post(add_by_location_name))
        .route("/{id}", put(update).delete(delete))
        .route_layer(from_fn_with_state(state.verifier.clone(), require_admin));

    let reads = Router::new()
        .route("/{id}", get(find_by_id))
        .route("/by-name/{name}", get(find_by_name))
        .route("/nearest/{lat}/{lon}", get(find_nearest))
        .route("/nearest-by-name/{location}", get(find_nearest_by_name));

    Router::new().merge(writes).merge(reads).with_state(state)
}

async fn add(
    State(state): State<SensorState>,
    Json(sensor): Json<SensorMetadata>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = state.sensors.add(sensor).await?;
    info!(%id, "sensor added");
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn add_by_location_name(
    State(state): State<SensorState>,
    Json(sensor): Json<SensorMetadataWithLocationName>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = state.sensors.add_with_location_name(sensor).await?;
    info!(%id, "sensor added by place name");
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn update(
    State(state): State<SensorState>,
    Path(id): Path<String>,
    Json(mut sensor): Json<SensorMetadata>,
) -> Result<StatusCode, ApiError> {
    match &sensor.id {
        Some(body_id) if *body_id != id => {
            return Err(ApiError::BadRequest("sensor id mismatch".to_string()));
        }
        _ => sensor.id = Some(id),
    }
    state.sensors.update(sensor).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete(
    State(state): State<SensorState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sensors.delete(&id).await?;
    info!(%id, "sensor deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_by_id(
    State(state): State<SensorState>,
    Path(id): Path<String>,
) -> Result<Json<SensorMetadata>, ApiError> {
    Ok(Json(state.sensors.find_by_id(&id).await?))
}

async fn find_by_name(
    State(state): State<SensorState>,
    Path(name): Path<String>,
) -> Result<Json<SensorMetadata>, ApiError> {
    Ok(Json(state.sensors.find_by_name(&name).await?))
}

async fn find_nearest(
    State(state): State<SensorState>,
    Path((lat, lon)): Path<(String, String)>,
) -> Result<Json<SensorMetadata>, ApiError> {
    Ok(Json(state.sensors.find_nearest(&lat, &lon).await?))
}

async fn find_nearest_by_name(
    State(state): State<SensorState>,
    Path(location): Path<String>,
) -> Result<Json<SensorMetadata>, ApiError> {
    Ok(Json(state.sensors.find_nearest_by_location_name(&location).await?))
}
