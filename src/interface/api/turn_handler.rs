//! JSON turn endpoint, for text channels and testing

use super::{ApiResponse, AppState};
use crate::application::{TurnRequest, TurnResponse};
use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};

pub async fn post_turn(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<ApiResponse<TurnResponse>>, StatusCode> {
    info!("API: Turn for call {}", request.caller_id);

    if request.caller_id.trim().is_empty() {
        return Ok(Json(ApiResponse::error("caller_id is required".to_string())));
    }

    let caller_id = request.caller_id.clone();
    match state.engine.handle_turn(request).await {
        Ok(response) => {
            if response.is_final {
                state.schedule_cleanup(caller_id);
            }
            Ok(Json(ApiResponse::success(response)))
        }
        Err(e) => {
            error!("API: Turn for call {} failed: {}", caller_id, e);
            Ok(Json(ApiResponse::error(e.to_string())))
        }
    }
}
