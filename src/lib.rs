pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/booking-request", post(handlers::booking::submit))
        .route("/api/moderate", get(handlers::moderate::moderate))
        .route(
            "/api/contract",
            get(handlers::contract::view).post(handlers::contract::action),
        )
        .route(
            "/api/reviews",
            get(handlers::reviews::list).post(handlers::reviews::submit),
        )
        .route("/api/reviews/moderate", get(handlers::reviews::moderate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
