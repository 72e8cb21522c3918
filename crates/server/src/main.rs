//! Style Server - learning style prediction service
//!
//! Loads the trained encoder and classifier once at startup, then serves
//! predictions over HTTP. Missing or corrupt artifacts are fatal.

use anyhow::{Context, Result};
use std::sync::Arc;
use style_lib::{
    artifacts,
    health::{Component, HealthRegistry},
    observability::{ServiceMetrics, StructuredLogger},
    store::{open_store, PredictionRecorder},
    InferenceContext,
};
use style_server::{api, ServiceConfig};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting style-server");

    let config = ServiceConfig::load()?;
    info!(
        service_name = %config.service_name,
        artifact_dir = %config.artifact_dir.display(),
        persistence = %config.persistence,
        "Service configured"
    );

    let health_registry = HealthRegistry::new();
    let metrics = ServiceMetrics::new();
    let logger = StructuredLogger::new(&config.service_name);

    let (encoder, model) = artifacts::load_artifacts(&config.artifact_dir).with_context(|| {
        format!(
            "Failed to load model artifacts from {}. Has training been run?",
            config.artifact_dir.display()
        )
    })?;
    let (seed, run, accuracy) = (model.seed, model.run, model.accuracy);
    let context = InferenceContext::new(encoder, model).context("Encoder and model do not match")?;
    health_registry.register(Component::Model).await;
    metrics.set_model_info(seed, run, accuracy);

    let opened = open_store(
        config.persistence,
        &config.store_path,
        config.memory_capacity,
    )
    .await;
    let store = match opened {
        Ok(store) => {
            if store.is_some() {
                health_registry.register(Component::Store).await;
            }
            store
        }
        Err(e) => {
            warn!(error = %e, "Prediction store unavailable, continuing without persistence");
            health_registry
                .set_degraded(Component::Store, format!("store failed to open: {}", e))
                .await;
            None
        }
    };

    let recorder = PredictionRecorder::new(
        store,
        health_registry.clone(),
        metrics.clone(),
        logger.clone(),
    );
    let app_state = Arc::new(
        api::AppState::new(
            Arc::new(context),
            recorder,
            health_registry.clone(),
            metrics,
            logger.clone(),
        )
        .with_max_list_limit(config.max_list_limit),
    );

    logger.log_startup(SERVICE_VERSION, seed, accuracy, &config.persistence.to_string());
    health_registry.set_ready(true).await;

    api::serve(&config.bind_addr(), app_state, shutdown_signal()).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
