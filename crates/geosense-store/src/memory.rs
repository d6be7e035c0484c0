//! In-memory store doubles.
//!
//! These implement the same traits and semantics as the MongoDB stores so
//! the service layers can be unit-tested without a live database. Nearest
//! lookup uses haversine great-circle distance over the derived geo point,
//! matching the metric of the 2dsphere index.

use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use geosense_types::Location;

use crate::credentials::CredentialStore;
use crate::error::{Error, Result};
use crate::models::{Credential, SensorRecord};
use crate::sensors::SensorStore;

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn add(&self, credential: Credential) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&credential.username) {
            return Err(Error::DuplicateUsername);
        }
        users.insert(credential.username.clone(), credential);
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Credential> {
        self.users
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or(Error::CredentialNotFound)
    }
}

/// In-memory sensor store.
#[derive(Default)]
pub struct MemorySensorStore {
    sensors: RwLock<Vec<SensorRecord>>,
}

impl MemorySensorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SensorStore for MemorySensorStore {
    async fn add(&self, mut record: SensorRecord) -> Result<ObjectId> {
        let id = ObjectId::new();
        record.id = Some(id);
        record.derive_geo();
        self.sensors.write().await.push(record);
        Ok(id)
    }

    async fn update(&self, mut record: SensorRecord) -> Result<()> {
        let id = record.id.ok_or(Error::MissingId)?;
        record.derive_geo();
        let mut sensors = self.sensors.write().await;
        if let Some(existing) = sensors.iter_mut().find(|s| s.id == Some(id)) {
            *existing = record;
        }
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> Result<()> {
        let mut sensors = self.sensors.write().await;
        let before = sensors.len();
        sensors.retain(|s| s.id != Some(id));
        if sensors.len() == before {
            return Err(Error::SensorNotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<SensorRecord> {
        self.sensors
            .read()
            .await
            .iter()
            .find(|s| s.id == Some(id))
            .cloned()
            .ok_or(Error::SensorNotFound)
    }

    async fn find_by_name(&self, name: &str) -> Result<SensorRecord> {
        self.sensors
            .read()
            .await
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or(Error::SensorNotFound)
    }

    async fn find_nearest(&self, location: Location) -> Result<SensorRecord> {
        let sensors = self.sensors.read().await;
        sensors
            .iter()
            .filter_map(|s| {
                let geo = s.geo.as_ref()?;
                let candidate = Location::new(geo.coordinates[1], geo.coordinates[0]);
                Some((haversine_km(location, candidate), s))
            })
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, s)| s.clone())
            .ok_or(Error::SensorNotFound)
    }
}

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two locations in kilometers.
fn haversine_km(a: Location, b: Location) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(name: &str, location: Option<Location>) -> SensorRecord {
        SensorRecord::new(
            name.to_string(),
            vec!["Tag1".to_string(), "Tag2".to_string()],
            location,
        )
    }

    #[tokio::test]
    async fn test_add_then_find_by_id_round_trips_geo() {
        let store = MemorySensorStore::new();
        let id = store
            .add(sensor("Sensor 1", Some(Location::new(55.0, 44.0))))
            .await
            .unwrap();

        let found = store.find_by_id(id).await.unwrap();
        assert_eq!(found.name, "Sensor 1");
        assert_eq!(found.tags, vec!["Tag1", "Tag2"]);
        assert_eq!(found.location, Some(Location::new(55.0, 44.0)));
        let geo = found.geo.unwrap();
        assert_eq!(geo.coordinates, [44.0, 55.0]);
    }

    #[tokio::test]
    async fn test_update_rederives_geo_and_keeps_id() {
        let store = MemorySensorStore::new();
        let id = store
            .add(sensor("Sensor 1", Some(Location::new(55.0, 44.0))))
            .await
            .unwrap();

        let mut updated = store.find_by_id(id).await.unwrap();
        updated.name = "New Name".to_string();
        updated.tags = vec!["Tag3".to_string()];
        updated.location = Some(Location::new(3.14, 123.0));
        store.update(updated).await.unwrap();

        let found = store.find_by_name("New Name").await.unwrap();
        assert_eq!(found.id, Some(id));
        assert_eq!(found.geo.unwrap().coordinates, [123.0, 3.14]);
    }

    #[tokio::test]
    async fn test_update_without_id_is_rejected() {
        let store = MemorySensorStore::new();
        let err = store
            .update(sensor("Sensor 1", None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingId));
    }

    #[tokio::test]
    async fn test_delete_then_find_by_id_fails() {
        let store = MemorySensorStore::new();
        let id = store
            .add(sensor("Sensor 1", Some(Location::new(55.0, 44.0))))
            .await
            .unwrap();

        store.delete(id).await.unwrap();
        let err = store.find_by_id(id).await.unwrap_err();
        assert!(matches!(err, Error::SensorNotFound));

        let err = store.delete(id).await.unwrap_err();
        assert!(matches!(err, Error::SensorNotFound));
    }

    #[tokio::test]
    async fn test_find_nearest_picks_closest_city() {
        let store = MemorySensorStore::new();
        store
            .add(sensor(
                "Sensor Washington",
                Some(Location::new(38.9072, -77.0369)),
            ))
            .await
            .unwrap();
        store
            .add(sensor("Sensor NY", Some(Location::new(40.7128, -74.0060))))
            .await
            .unwrap();
        store
            .add(sensor(
                "Sensor Atlanta",
                Some(Location::new(33.7488, -84.3877)),
            ))
            .await
            .unwrap();

        let nearest = store
            .find_nearest(Location::new(34.0, 45.0))
            .await
            .unwrap();
        assert_eq!(nearest.name, "Sensor NY");

        let nearest = store
            .find_nearest(Location::new(34.0, -74.0))
            .await
            .unwrap();
        assert_eq!(nearest.name, "Sensor Washington");

        let nearest = store
            .find_nearest(Location::new(36.1627, -86.7816))
            .await
            .unwrap();
        assert_eq!(nearest.name, "Sensor Atlanta");
    }

    #[tokio::test]
    async fn test_find_nearest_skips_sensors_without_location() {
        let store = MemorySensorStore::new();
        store.add(sensor("No Location", None)).await.unwrap();

        let err = store
            .find_nearest(Location::new(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SensorNotFound));

        store
            .add(sensor("Located", Some(Location::new(10.0, 10.0))))
            .await
            .unwrap();
        let nearest = store
            .find_nearest(Location::new(0.0, 0.0))
            .await
            .unwrap();
        assert_eq!(nearest.name, "Located");
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected_and_not_persisted() {
        let store = MemoryCredentialStore::new();
        let first = Credential {
            username: "alice".to_string(),
            password_hash: "hash-one".to_string(),
            role: geosense_types::Role::User,
        };
        store.add(first).await.unwrap();

        let second = Credential {
            username: "alice".to_string(),
            password_hash: "hash-two".to_string(),
            role: geosense_types::Role::Admin,
        };
        let err = store.add(second).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateUsername));

        let stored = store.find_by_username("alice").await.unwrap();
        assert_eq!(stored.password_hash, "hash-one");
    }

    #[tokio::test]
    async fn test_find_by_name_returns_first_match() {
        let store = MemorySensorStore::new();
        let first = store
            .add(sensor("Duplicate", Some(Location::new(1.0, 1.0))))
            .await
            .unwrap();
        store
            .add(sensor("Duplicate", Some(Location::new(2.0, 2.0))))
            .await
            .unwrap();

        let found = store.find_by_name("Duplicate").await.unwrap();
        assert_eq!(found.id, Some(first));
    }
}
