//! Heal backend - cycle prediction and landing page API
//!
//! Resolves store credentials, seeds demo data on first start and serves
//! the HTTP API until interrupted.

use anyhow::{Context, Result};
use heal_lib::{
    health::{components, HealthRegistry},
    observability::{ServiceMetrics, StructuredLogger},
    seed::seed_demo_data,
    store::{DocumentStore, MemoryStore},
};
use heal_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs, filtered by RUST_LOG
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting heal-server");

    let config = ServerConfig::load()?;
    info!(instance = %config.instance_name, "Server configured");

    let health_registry = HealthRegistry::new();
    health_registry.register(components::STORE).await;
    health_registry.register(components::PREDICTOR).await;
    health_registry.register(components::SEEDER).await;

    let metrics = ServiceMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);

    let settings = config.store_settings()?;
    info!(
        project_id = %settings.project_id,
        credentials = %settings.credentials.source,
        "Store credentials resolved"
    );
    let store = Arc::new(
        MemoryStore::open(&settings)
            .context("Failed to open document store")?
            .with_health(health_registry.clone()),
    );

    if config.seed_on_startup {
        match seed_demo_data(store.as_ref(), config.seed).await {
            Ok(report) => {
                logger.log_seed(
                    report.users_created,
                    report.users_skipped,
                    report.documents_written,
                );
                metrics.add_seeded_users(report.users_created as u64);
            }
            Err(e) => {
                warn!(error = %e, "Demo data seeding failed");
                health_registry
                    .set_degraded(components::SEEDER, e.to_string())
                    .await;
            }
        }
    }

    let store: Arc<dyn DocumentStore> = store;
    let app_state = Arc::new(api::AppState::new(
        store,
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    health_registry.set_ready(true).await;
    logger.log_startup(SERVER_VERSION, &settings.project_id, config.api_port);

    let shutdown_logger = logger.clone();
    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
        }
        shutdown_logger.log_shutdown("SIGINT received");
    };

    api::serve(&config.listen_addr(), app_state, shutdown).await?;
    info!("Shutting down");

    Ok(())
}
