//! tsuzuri-server - HTTP front end for the clinical document pipeline
//!
//! Exposes the transform, bundle validation and wareki conversion operations
//! of `tsuzuri-core` over JSON.

pub mod config;
pub mod handlers;

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tsuzuri_core::Transformer;

/// Application state
pub struct AppState {
    pub config: config::ServerConfig,
    pub transformer: Transformer,
}

impl AppState {
    pub fn new(config: config::ServerConfig) -> Self {
        let transformer = Transformer::new(config.pipeline.clone());
        Self {
            config,
            transformer,
        }
    }
}

/// Build the application router with all routes and middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let body_limit = state.config.server.body_limit;

    Router::new()
        .route("/health", get(handlers::metadata::health_check))
        .route("/metadata", get(handlers::metadata::capability_statement))
        .route("/$transform", post(handlers::transform::transform))
        .route("/Bundle/$validate", post(handlers::validate::validate))
        .route("/$wareki", get(handlers::wareki::wareki))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
