use std::{sync::Arc, time::Duration};

use tiptop_site::{
    AppState,
    api::{ApiState, HttpBackendApi},
    cache::CachedBackendApi,
    config::{AppConfig, Env},
    create_router,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging, builds the upstream API client and serves
/// the site.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins over the defaults below.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tiptop_site=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    tracing::info!(api_base_url = %config.api_base_url, "Using upstream API");

    // 3. Upstream API client, optionally behind the catalog cache
    let http_api = HttpBackendApi::new(&config.api_base_url)
        .expect("FATAL: Failed to build the upstream HTTP client.");
    let api: ApiState = if config.catalog_cache_secs > 0 {
        tracing::info!(ttl_secs = config.catalog_cache_secs, "Catalog cache enabled");
        Arc::new(CachedBackendApi::new(
            Arc::new(http_api),
            Duration::from_secs(config.catalog_cache_secs),
        ))
    } else {
        Arc::new(http_api)
    };

    // 4. Router and server
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { api, config });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|error| panic!("FATAL: Failed to bind {bind_addr}: {error}"));

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at: http://{bind_addr}/swagger-ui");

    if let Err(error) = axum::serve(listener, app).await {
        tracing::error!(%error, "Server terminated");
    }
}
