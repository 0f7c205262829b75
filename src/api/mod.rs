mod error;
mod handlers;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::classifier::ClassifierService;

// Slack on top of the message limit for the JSON envelope.
const ENVELOPE_OVERHEAD: usize = 64 * 1024;

pub fn router(service: ClassifierService, max_input_bytes: usize) -> Router {
    Router::new()
        .route("/classify", post(handlers::classify))
        .route("/classify/file", post(handlers::classify_file))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(
            max_input_bytes.saturating_add(ENVELOPE_OVERHEAD),
        ))
        .with_state(service)
}
