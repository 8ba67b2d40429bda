//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::services::email::create_notifier;
use crate::state::AppState;
use anyhow::{Context, Result};
use consign_core::{Config, TimestampIdentifierGenerator};
use consign_storage::LocalUploadStore;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.environment())?;

    tracing::info!(
        environment = %config.environment(),
        upload_dir = %config.intake.upload_dir.display(),
        transport = ?config.mail.transport,
        "Configuration loaded and validated successfully"
    );

    let store = Arc::new(LocalUploadStore::from_settings(&config.intake));
    let notifier = create_notifier(&config).context("Failed to initialize notifier")?;
    let ids = Arc::new(TimestampIdentifierGenerator::new(
        config.intake.tracking_prefix.clone(),
    ));

    let state = Arc::new(AppState::new(config, store, notifier, ids));
    let router = routes::build_router(state.clone());

    Ok((state, router))
}
