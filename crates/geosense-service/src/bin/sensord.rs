//! geosense-sensord - sensor-metadata REST API.
//!
//! Run with: `cargo run -p geosense-service --bin geosense-sensord`

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use geosense_service::api::{SensorState, sensor_router};
use geosense_service::{MapboxGeocoder, SensorConfig, SensorMetadataService, TokenVerifier};
use geosense_store::MongoSensorStore;

/// geosense sensor service - CRUD and proximity lookup over sensor metadata.
#[derive(Parser, Debug)]
#[command(name = "geosense-sensord")]
#[command(version, about, long_about = None)]
struct Args {
    /// Bind address (overrides BIND).
    #[arg(short, long)]
    bind: Option<String>,

    /// Document store URI (overrides MONGO_URI).
    #[arg(long)]
    mongo_uri: Option<String>,

    /// Database name (overrides MONGO_DB).
    #[arg(long)]
    mongo_db: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("geosense_service=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let mut config = SensorConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(uri) = args.mongo_uri {
        config.mongo_uri = uri;
    }
    if let Some(db) = args.mongo_db {
        config.mongo_db = db;
    }

    info!("Connecting to document store at {}", config.mongo_uri);
    let store = MongoSensorStore::connect(&config.mongo_uri, &config.mongo_db).await?;
    let geocoder = MapboxGeocoder::new(config.geocoding_api_key.clone());

    let sensors = Arc::new(SensorMetadataService::new(
        Arc::new(store),
        Arc::new(geocoder),
    ));
    let verifier = Arc::new(TokenVerifier::new(config.public_key_pem.as_bytes())?);

    let app = sensor_router(SensorState { sensors, verifier })
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = config.bind.parse()?;
    info!("Starting sensor service on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
