//! Application state shared by every handler.

use std::sync::Arc;

use consign_core::{Config, IdentifierGenerator};
use consign_storage::UploadStore;

use crate::services::email::Notifier;
use crate::services::intake::IntakeService;

/// Configuration and the intake collaborators.
///
/// Built once in [`crate::setup::initialize_app`] (or by tests with fakes) and
/// never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub intake: IntakeService,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn UploadStore>,
        notifier: Arc<dyn Notifier>,
        ids: Arc<dyn IdentifierGenerator>,
    ) -> Self {
        let config = Arc::new(config);
        let intake = IntakeService::new(config.clone(), store, notifier, ids);
        Self { config, intake }
    }
}
