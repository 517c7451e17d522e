//! Prometheus metrics

use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the global Prometheus recorder and describe our metrics
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        .install_recorder()?;

    describe_counter!("http_requests_total", "Total number of HTTP requests received");
    describe_histogram!("http_request_duration_seconds", "HTTP request duration in seconds");
    describe_counter!("calls_started_total", "Calls that reached the assistant");
    describe_counter!("dialogue_turns_total", "Processed caller turns by resulting step");
    describe_counter!("reservations_saved_total", "Reservations committed to storage");
    describe_counter!("reservations_failed_total", "Reservations that could not be stored");
    describe_counter!("calls_cancelled_total", "Calls where the caller cancelled");
    describe_counter!("calls_abandoned_total", "Calls ended after the caller stopped answering");
    describe_counter!("sessions_expired_total", "Idle sessions dropped by the sweeper");
    describe_counter!(
        "generative_fallbacks_total",
        "Generative model answers replaced by the rule-based path"
    );

    Ok(handle)
}

pub async fn metrics_handler(State(prometheus_handle): State<PrometheusHandle>) -> Response {
    (StatusCode::OK, prometheus_handle.render()).into_response()
}

/// Record HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: std::time::Duration) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string(), "status" => status.to_string())
        .increment(1);
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Middleware counting every request by its route template
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    record_http_request(&method, &path, response.status().as_u16(), start.elapsed());
    response
}
