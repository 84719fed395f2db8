//! Header Hub - Main Application Entry Point
//!
//! Evaluates response headers for users by matching enabled policies
//! against a live LDAP directory, and manages the configuration documents
//! behind them.

use header_hub_api::{auth::JwtService, AppState};
use header_hub_directory::LdapDirectoryProvider;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,header_hub=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()?;

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set, using the development secret");
        "header-hub-dev-secret".to_string()
    });
    let jwt_expire_secs = std::env::var("JWT_EXPIRE_SECS")
        .unwrap_or_else(|_| "86400".to_string())
        .parse::<i64>()?;
    let jwt = JwtService::new(&jwt_secret, jwt_expire_secs);

    tracing::info!("Starting Header Hub server on {}:{}", host, port);

    // Initialize storage backend
    let storage_type = std::env::var("STORAGE_TYPE").unwrap_or_else(|_| "memory".to_string());

    let app_state = if storage_type == "couchbase" {
        #[cfg(feature = "couchbase")]
        {
            use header_hub_storage::CouchbaseStorage;
            tracing::info!("Initializing Couchbase storage...");
            let store = Arc::new(CouchbaseStorage::with_defaults().await?);
            Arc::new(AppState::with_store(
                store,
                Arc::new(LdapDirectoryProvider),
                jwt,
            ))
        }
        #[cfg(not(feature = "couchbase"))]
        {
            anyhow::bail!("Couchbase storage requested but 'couchbase' feature not enabled");
        }
    } else {
        tracing::info!("Initializing in-memory storage...");
        let store = Arc::new(header_hub_storage::MemoryStore::new());
        Arc::new(AppState::with_store(
            store,
            Arc::new(LdapDirectoryProvider),
            jwt,
        ))
    };

    // Build our application with routes
    let app = header_hub_api::create_router(app_state);

    // Run it
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
