//! Router assembly.

pub mod shapes;
pub mod ws;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ws", get(ws::ws_handler))
        .route("/shapes/{room}", get(shapes::list_shapes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> &'static str {
    "Sketchroom server - connect via WebSocket at /ws?token=..."
}

async fn health() -> &'static str {
    "ok"
}
