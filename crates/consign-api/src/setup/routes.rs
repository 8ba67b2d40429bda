//! Route configuration and setup

use crate::handlers;
use crate::middleware::security_headers_middleware;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Path the consignment form posts to
pub const SUBMIT_PATH: &str = "/submit-consign-form";

/// Room for the text fields on top of the file size limit.
const FORM_FIELDS_ALLOWANCE_BYTES: usize = 256 * 1024;

/// Build the router around prepared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes()
        .saturating_add(FORM_FIELDS_ALLOWANCE_BYTES);
    tracing::info!(body_limit_bytes = body_limit, "Request body limit configured");

    Router::new()
        .route(SUBMIT_PATH, any(handlers::consign::submit_consign_form))
        .route("/health", get(handlers::health::liveness_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state)
}
