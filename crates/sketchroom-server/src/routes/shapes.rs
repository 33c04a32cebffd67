use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::state::AppState;

/// `GET /shapes/{room}`: persisted shapes of a room in creation order.
pub async fn list_shapes(State(state): State<AppState>, Path(room): Path<String>) -> Response {
    match state.relay.room_shapes(&room).await {
        Ok(Some(shapes)) => Json(json!({ "shapes": shapes })).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Room not found" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(room = %room, error = %e, "Failed to fetch shapes");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Failed to fetch shapes" })),
            )
                .into_response()
        }
    }
}
