pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::web::handlers;

/// Largest accepted resume upload.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Browser flow
        .route(
            "/",
            get(handlers::index_page)
                .post(handlers::submit_search)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/result", get(handlers::result_page))
        // JSON API
        .route("/api/v1/search", post(handlers::api_search))
        .with_state(state)
}
