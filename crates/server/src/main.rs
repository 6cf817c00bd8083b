use std::sync::Arc;

use anyhow::Context;
use gloss_core::{BatchRunner, EnrichConfig, HttpGenerator};
use gloss_server::{PgStore, ServerConfig, router};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,gloss_core=debug,gloss_server=debug";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down gracefully");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env().context("Failed to read configuration")?;
    let store = PgStore::connect(&config.database_url).context("Failed to create database pool")?;

    let generator = match config.generator {
        Some(generator) => Some(HttpGenerator::new(generator).context("Invalid generator configuration")?),
        None => {
            tracing::warn!("GLOSS_GENERATOR_KEY not set; summary boxes will not be generated");
            None
        }
    };

    let enrich = EnrichConfig::builder().article_prefix(config.article_prefix).build();
    let app = router(Arc::new(BatchRunner::new(enrich, store, generator)));

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!("gloss-server listening on {}", config.bind);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.context("Server error")?;
    Ok(())
}
