use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::post;
use axum::Router;
use datasets::MAX_UPLOAD_BYTES;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::routes_ingest::upload_dataset;
use crate::routes_repo::sync_repository;
use crate::state::SharedState;

pub const API_TITLE: &str = "ZONE-GPT Core API";
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const API_DESCRIPTION: &str = "Multi-agent business intelligence and operational management";

/// Transport cap for request bodies. Kept above the validation ceiling so
/// slightly oversized CSVs reach the validator and get its 413 message.
pub const UPLOAD_BODY_LIMIT: usize = 2 * MAX_UPLOAD_BYTES;

pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/ingest/upload", post(upload_dataset))
        .route("/repo/sync", post(sync_repository))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .layer(cors)
        .with_state(state)
}

/// No origins configured: anything goes. Otherwise only the listed origins,
/// with credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
