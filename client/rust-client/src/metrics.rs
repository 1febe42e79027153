use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

use crate::error::ClientError;

lazy_static! {
    // API Metrics
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "banana_api_requests_total",
        "Total number of requests sent to the game API",
        &["endpoint", "status"]
    )
    .unwrap();

    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "banana_api_request_duration_seconds",
        "Game API request duration in seconds",
        &["endpoint"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    pub static ref TOKEN_REFRESH_TOTAL: IntCounterVec = register_int_counter_vec!(
        "banana_token_refresh_total",
        "Access token refresh attempts",
        &["status"]
    )
    .unwrap();

    // Game Metrics
    pub static ref ROUNDS_STARTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "banana_rounds_started_total",
        "Rounds started, by difficulty",
        &["difficulty"]
    )
    .unwrap();

    pub static ref ANSWERS_SUBMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "banana_answers_submitted_total",
        "Answers resolved by the server",
        &["correct"]
    )
    .unwrap();

    pub static ref ROUND_TIMEOUTS_TOTAL: IntCounter = register_int_counter!(
        "banana_round_timeouts_total",
        "Rounds that ran out of time"
    )
    .unwrap();

    pub static ref POWER_UPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "banana_power_ups_total",
        "Power-up activation outcomes",
        &["kind", "status"]
    )
    .unwrap();

    pub static ref STALE_RESPONSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "banana_stale_responses_total",
        "Responses and timer callbacks discarded because their round was replaced",
        &["kind"]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track an API call with metrics
pub async fn track_api_call<F, T>(endpoint: &str, future: F) -> Result<T, ClientError>
where
    F: std::future::Future<Output = Result<T, ClientError>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = match &result {
        Ok(_) => "success",
        Err(ClientError::Rejected { .. }) => "rejected",
        Err(ClientError::SessionExpired) => "session_expired",
        Err(_) => "error",
    };

    API_REQUESTS_TOTAL
        .with_label_values(&[endpoint, status])
        .inc();

    API_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint])
        .observe(duration);

    result
}

pub fn record_power_up(kind: &str, status: &str) {
    POWER_UPS_TOTAL.with_label_values(&[kind, status]).inc();
}

pub fn record_stale(kind: &str) {
    STALE_RESPONSES_TOTAL.with_label_values(&[kind]).inc();
}
