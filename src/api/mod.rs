use axum::{Router, routing::post};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::fetcher::WolFetcher;

pub mod handlers;
pub mod models;

/// Shared state of the API server.
pub struct AppState {
    pub fetcher: WolFetcher,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", post(handlers::search_handler))
        .with_state(state)
        .layer(cors)
}
