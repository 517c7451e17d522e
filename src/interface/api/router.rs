//! API Router configuration

use super::metrics_handler::{metrics_handler, track_requests};
use super::session_handler::get_session;
use super::turn_handler::post_turn;
use super::voice_handler::{call_status, voice_webhook};
use super::{health_check, AppState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the HTTP router
pub fn build_router(state: AppState, prometheus_handle: PrometheusHandle) -> Router {
    let voice_path = state.gather.action.clone();
    let status_path = format!("{}/status", voice_path.trim_end_matches('/'));

    let health_routes = Router::new().route("/health", get(health_check));

    // Telephony webhook; the gather action posts back to the same path
    let voice_routes = Router::new()
        .route(&voice_path, post(voice_webhook))
        .route(&status_path, post(call_status));

    let api_routes = Router::new()
        .route("/api/turns", post(post_turn))
        .route("/api/sessions/:call_id", get(get_session));

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    Router::new()
        .merge(health_routes)
        .merge(voice_routes)
        .merge(api_routes)
        .with_state(state)
        .merge(metrics_routes)
        .layer(middleware::from_fn(track_requests))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
