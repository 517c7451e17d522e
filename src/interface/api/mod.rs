//! HTTP surface: the telephony webhook plus a small JSON API

pub mod metrics_handler;
pub mod router;
pub mod session_handler;
pub mod turn_handler;
pub mod voice_handler;

use crate::application::ConversationEngine;
use crate::config::TelephonyConfig;
use crate::infrastructure::telephony::GatherSettings;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub use metrics_handler::init_metrics;
pub use router::build_router;

/// Generic JSON envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
    pub gather: GatherSettings,
    /// How long a finished call's session is kept around
    pub cleanup_delay: Duration,
}

impl AppState {
    pub fn new(engine: Arc<ConversationEngine>) -> Self {
        Self {
            engine,
            gather: GatherSettings::default(),
            cleanup_delay: Duration::from_secs(60),
        }
    }

    pub fn with_telephony(mut self, telephony: &TelephonyConfig) -> Self {
        self.gather = GatherSettings {
            action: telephony.action_path.clone(),
            speech_timeout: telephony.speech_timeout.clone(),
            timeout_secs: telephony.gather_timeout_secs,
        };
        self
    }

    pub fn with_cleanup_delay(mut self, delay: Duration) -> Self {
        self.cleanup_delay = delay;
        self
    }

    /// Periodically drop sessions of calls that stopped without ending
    pub fn spawn_idle_sweeper(&self, every: Duration, ttl: Duration) -> tokio::task::JoinHandle<()> {
        let engine = self.engine.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                if let Err(e) = engine.sweep_idle_sessions(ttl).await {
                    warn!("Idle session sweep failed: {}", e);
                }
            }
        })
    }

    /// Drop a finished call's session once the delay has passed
    pub(crate) fn schedule_cleanup(&self, call_id: String) {
        let sessions = self.engine.sessions().clone();
        let delay = self.cleanup_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match sessions.delete(&call_id).await {
                Ok(true) => debug!("Session {} released", call_id),
                Ok(false) => debug!("Session {} was already gone", call_id),
                Err(e) => warn!("Failed to release session {}: {}", call_id, e),
            }
        });
    }
}

/// Liveness probe
pub async fn health_check() -> axum::Json<ApiResponse<&'static str>> {
    axum::Json(ApiResponse::success("OK"))
}
