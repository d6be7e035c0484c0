//! Data models for stored documents.

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use geosense_types::{Location, Role};

/// A registered user credential.
///
/// The username is unique at the store (enforced by a unique index); the
/// password is stored only as an opaque bcrypt digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Unique username.
    pub username: String,
    /// Opaque password digest. Never the plaintext.
    pub password_hash: String,
    /// Authorization role granted to tokens issued for this credential.
    pub role: Role,
}

/// GeoJSON point stored alongside a sensor's location.
///
/// Coordinates are ordered longitude first, then latitude, per the GeoJSON
/// convention the 2dsphere index expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl From<Location> for GeoPoint {
    fn from(location: Location) -> Self {
        GeoPoint {
            kind: "Point".to_string(),
            coordinates: [location.lon, location.lat],
        }
    }
}

/// A sensor-metadata document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Store-assigned identifier. `None` until first persisted; immutable
    /// once assigned.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Human-readable name. Not required to be unique.
    pub name: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Last known location, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// GeoJSON point derived from `location`. Recomputed on every write;
    /// present exactly when `location` is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoPoint>,
}

impl SensorRecord {
    /// Create an unpersisted record. The geo point is derived lazily by the
    /// store on write.
    pub fn new(name: String, tags: Vec<String>, location: Option<Location>) -> Self {
        SensorRecord {
            id: None,
            name,
            tags,
            location,
            geo: None,
        }
    }

    /// Recompute the derived geo point from the current location.
    ///
    /// Stores call this before every insert or replace so the indexable
    /// field can never drift from the location it was derived from.
    pub fn derive_geo(&mut self) {
        self.geo = self.location.map(GeoPoint::from);
    }
}
