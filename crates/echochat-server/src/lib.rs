//! EchoChat server - HTTP surface for the streaming echo emitter

pub mod api;
pub mod config;
pub mod logging;

use api::{AppState, chat::chat};
use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

#[derive(serde::Serialize)]
struct Health {
    status: String,
}

async fn health() -> axum::Json<Health> {
    axum::Json(Health {
        status: "echochat is working!".to_string(),
    })
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(echochat_core::REQUEST_ID_HEADER),
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .layer(cors)
        .with_state(state)
}
