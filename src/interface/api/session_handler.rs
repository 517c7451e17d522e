//! Session inspection

use super::{ApiResponse, AppState};
use crate::domain::conversation::{CallSession, Slots, Step, Turn};
use crate::domain::language::Language;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub call_id: String,
    pub caller_number: Option<String>,
    pub step: Step,
    pub language: Option<Language>,
    pub slots: Slots,
    pub misses: u32,
    pub history: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CallSession> for SessionView {
    fn from(session: CallSession) -> Self {
        Self {
            call_id: session.call_id().to_string(),
            caller_number: session.caller_number().map(str::to_string),
            step: session.step(),
            language: session.language(),
            slots: session.slots().clone(),
            misses: session.misses(),
            history: session.history().to_vec(),
            created_at: session.created_at(),
            updated_at: session.updated_at(),
        }
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Result<Json<ApiResponse<SessionView>>, StatusCode> {
    info!("API: Getting session {}", call_id);

    match state.engine.sessions().get(&call_id).await {
        Ok(Some(session)) => Ok(Json(ApiResponse::success(session.into()))),
        Ok(None) => Ok(Json(ApiResponse::error(format!("Session {} not found", call_id)))),
        Err(e) => {
            error!("API: Failed to get session: {}", e);
            Ok(Json(ApiResponse::error(e.to_string())))
        }
    }
}
