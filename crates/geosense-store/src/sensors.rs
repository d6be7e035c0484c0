//! Sensor-metadata persistence with geospatial lookup.

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::{Client, Collection, IndexModel};
use tracing::info;

use geosense_types::Location;

use crate::error::{Error, Result};
use crate::models::SensorRecord;

const SENSORS_COLLECTION: &str = "sensorMetadata";

/// Store of sensor-metadata records.
#[async_trait]
pub trait SensorStore: Send + Sync {
    /// Insert a new record, deriving the geo point first. Returns the
    /// store-assigned id.
    async fn add(&self, record: SensorRecord) -> Result<ObjectId>;

    /// Full-document replace of an existing record. The geo point is
    /// re-derived; fails with [`Error::MissingId`] if the record has never
    /// been persisted.
    async fn update(&self, record: SensorRecord) -> Result<()>;

    /// Delete a record by id.
    async fn delete(&self, id: ObjectId) -> Result<()>;

    /// Find a record by id.
    async fn find_by_id(&self, id: ObjectId) -> Result<SensorRecord>;

    /// Find the first record with the given name. Names are not unique.
    async fn find_by_name(&self, name: &str) -> Result<SensorRecord>;

    /// Find the record nearest to a location by great-circle distance.
    /// There is no distance cutoff; only records carrying a geo point are
    /// candidates.
    async fn find_nearest(&self, location: Location) -> Result<SensorRecord>;
}

/// MongoDB-backed sensor store.
pub struct MongoSensorStore {
    sensors: Collection<SensorRecord>,
}

impl MongoSensorStore {
    /// Connect to the store and ensure the name and 2dsphere indexes.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let sensors = client
            .database(database)
            .collection::<SensorRecord>(SENSORS_COLLECTION);

        let indexes = [
            IndexModel::builder().keys(doc! { "name": 1 }).build(),
            IndexModel::builder().keys(doc! { "geo": "2dsphere" }).build(),
        ];
        sensors.create_indexes(indexes).await?;
        info!(database, "connected sensor store");

        Ok(Self { sensors })
    }
}

#[async_trait]
impl SensorStore for MongoSensorStore {
    async fn add(&self, mut record: SensorRecord) -> Result<ObjectId> {
        let id = ObjectId::new();
        record.id = Some(id);
        record.derive_geo();
        self.sensors.insert_one(&record).await?;
        Ok(id)
    }

    async fn update(&self, mut record: SensorRecord) -> Result<()> {
        let id = record.id.ok_or(Error::MissingId)?;
        record.derive_geo();
        // Last-writer-wins; concurrent replaces are accepted at this scope.
        self.sensors
            .replace_one(doc! { "_id": id }, &record)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> Result<()> {
        let result = self.sensors.delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Err(Error::SensorNotFound);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<SensorRecord> {
        self.sensors
            .find_one(doc! { "_id": id })
            .await?
            .ok_or(Error::SensorNotFound)
    }

    async fn find_by_name(&self, name: &str) -> Result<SensorRecord> {
        self.sensors
            .find_one(doc! { "name": name })
            .await?
            .ok_or(Error::SensorNotFound)
    }

    async fn find_nearest(&self, location: Location) -> Result<SensorRecord> {
        let filter = doc! {
            "geo": {
                "$near": {
                    "$geometry": {
                        "type": "Point",
                        "coordinates": [location.lon, location.lat],
                    }
                }
            }
        };
        self.sensors
            .find_one(filter)
            .await?
            .ok_or(Error::SensorNotFound)
    }
}
