use std::sync::Arc;

use anyhow::Context;
use rust_kv_catalog::config::Config;
use rust_kv_catalog::kv::RestStore;
use rust_kv_catalog::repository::Repository;
use rust_kv_catalog::routes;
use rust_kv_catalog::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("rust-kv-catalog starting");

    let config = Config::from_env()?;
    config.log_startup();

    let store = RestStore::from_config(&config)?;
    let addr = format!("{}:{}", config.service_host, config.service_port);

    let state = AppState {
        repository: Repository::new(Arc::new(store)),
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("rust-kv-catalog stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
