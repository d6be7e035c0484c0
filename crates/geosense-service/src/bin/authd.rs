//! geosense-authd - credential registration and token issuance.
//!
//! Run with: `cargo run -p geosense-service --bin geosense-authd`

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use geosense_auth::{Authenticator, password};
use geosense_service::api::{AuthState, auth_router};
use geosense_service::{AuthConfig, TokenVerifier};
use geosense_store::MongoCredentialStore;

/// geosense authenticator - issues signed tokens for the sensor API.
#[derive(Parser, Debug)]
#[command(name = "geosense-authd")]
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

    let mut config = AuthConfig::from_env()?;
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
    let root_hash = password::hash(&config.root_password)?;
    let credentials =
        MongoCredentialStore::connect(&config.mongo_uri, &config.mongo_db, &root_hash).await?;

    let authenticator = Arc::new(Authenticator::new(
        Arc::new(credentials),
        config.private_key_pem.as_bytes(),
        config.token_ttl,
    )?);
    let verifier = Arc::new(TokenVerifier::new(config.public_key_pem.as_bytes())?);

    let app = auth_router(AuthState {
        authenticator,
        verifier,
    })
    .layer(TraceLayer::new_for_http())
    .layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let addr: SocketAddr = config.bind.parse()?;
    info!("Starting authenticator on {}", addr);

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
