//! Sensor-metadata DTO service.
//!
//! Translates between the external representation (hex-encoded ids,
//! string-encoded coordinates) and the storage records, and composes the
//! geocoding adapter for name-based location lookups. All sensor storage
//! access goes through this layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use geosense_store::{ObjectId, SensorRecord, SensorStore};
use geosense_types::Location;

use crate::geocode::{GeocodeError, Geocoder};

/// Result type for sensor DTO operations.
pub type Result<T> = std::result::Result<T, SensorServiceError>;

/// Errors from the sensor DTO service.
#[derive(Debug, thiserror::Error)]
pub enum SensorServiceError {
    /// A coordinate string did not parse as a number.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// A sensor id string was not a valid hex object id.
    #[error("invalid sensor id: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Store(#[from] geosense_store::Error),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}

/// External location representation with string-encoded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDto {
    pub lat: String,
    pub lon: String,
}

/// External sensor representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorMetadata {
    /// Hex-encoded store id. Absent until first persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationDto>,
}

/// External sensor representation carrying a place name instead of
/// coordinates; the name is resolved through the geocoder on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorMetadataWithLocationName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: String,
}

impl SensorMetadata {
    /// Convert to the storage record, parsing coordinates and id.
    fn to_record(&self) -> Result<SensorRecord> {
        let location = match &self.location {
            Some(dto) => Some(Location::new(
                parse_coordinate(&dto.lat)?,
                parse_coordinate(&dto.lon)?,
            )),
            None => None,
        };
        let mut record = SensorRecord::new(self.name.clone(), self.tags.clone(), location);
        if let Some(id) = &self.id {
            record.id =
                Some(ObjectId::parse_str(id).map_err(|_| SensorServiceError::InvalidId(id.clone()))?);
        }
        Ok(record)
    }

    fn from_record(record: SensorRecord) -> Self {
        SensorMetadata {
            id: record.id.map(|id| id.to_hex()),
            name: record.name,
            tags: record.tags,
            location: record.location.map(|loc| LocationDto {
                lat: format!("{:.6}", loc.lat),
                lon: format!("{:.6}", loc.lon),
            }),
        }
    }
}

fn parse_coordinate(raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| SensorServiceError::InvalidCoordinate(raw.to_string()))
}

fn parse_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| SensorServiceError::InvalidId(raw.to_string()))
}

/// Mediates all sensor storage access for the HTTP layer.
pub struct SensorMetadataService {
    store: Arc<dyn SensorStore>,
    geocoder: Arc<dyn Geocoder>,
}

impl SensorMetadataService {
    pub fn new(store: Arc<dyn SensorStore>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { store, geocoder }
    }

    /// Insert a sensor, returning its hex-encoded id.
    pub async fn add(&self, sensor: SensorMetadata) -> Result<String> {
        let record = sensor.to_record()?;
        let id = self.store.add(record).await?;
        Ok(id.to_hex())
    }

    /// Resolve the place name to coordinates, then insert.
    pub async fn add_with_location_name(
        &self,
        sensor: SensorMetadataWithLocationName,
    ) -> Result<String> {
        let location = self.geocoder.find_lat_lon(&sensor.location).await?;
        self.add(SensorMetadata {
            id: sensor.id,
            name: sensor.name,
            tags: sensor.tags,
            location: Some(LocationDto {
                lat: location.lat.to_string(),
                lon: location.lon.to_string(),
            }),
        })
        .await
    }

    /// Full replace of an existing sensor.
    pub async fn update(&self, sensor: SensorMetadata) -> Result<()> {
        let record = sensor.to_record()?;
        Ok(self.store.update(record).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        Ok(self.store.delete(parse_id(id)?).await?)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<SensorMetadata> {
        let record = self.store.find_by_id(parse_id(id)?).await?;
        Ok(SensorMetadata::from_record(record))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<SensorMetadata> {
        let record = self.store.find_by_name(name).await?;
        Ok(SensorMetadata::from_record(record))
    }

    /// Nearest sensor to string-encoded coordinates.
    pub async fn find_nearest(&self, lat: &str, lon: &str) -> Result<SensorMetadata> {
        let location = Location::new(parse_coordinate(lat)?, parse_coordinate(lon)?);
        let record = self.store.find_nearest(location).await?;
        Ok(SensorMetadata::from_record(record))
    }

    /// Nearest sensor to a place name, resolved through the geocoder.
    pub async fn find_nearest_by_location_name(&self, place: &str) -> Result<SensorMetadata> {
        let location = self.geocoder.find_lat_lon(place).await?;
        let record = self.store.find_nearest(location).await?;
        Ok(SensorMetadata::from_record(record))
    }
}
