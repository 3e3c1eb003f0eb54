pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/generate", post(handlers::handle_generate))
        .route(
            "/api/v1/generate/upload",
            post(handlers::handle_generate_upload),
        )
        .route("/api/v1/parse", post(handlers::handle_parse))
        .route("/api/v1/edit", post(handlers::handle_edit))
        .route("/api/v1/preview", post(handlers::handle_preview))
        .with_state(state)
}
