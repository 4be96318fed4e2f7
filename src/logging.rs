//! Logging utilities for the bandmap server.
//!
//! Structured fields (`operation`, `duration_ms`, `request_id`) keep the
//! logs searchable when the server runs behind a log collector.

use std::time::Instant;
use tracing::{debug, error, info, warn, Level};

use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use uuid::Uuid;

use crate::error::BandMapError;

/// Creates the tracing layer for HTTP request/response logging
pub fn create_http_trace_layer() -> TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
    DefaultMakeSpan,
    DefaultOnRequest,
    DefaultOnResponse,
> {
    let on_response = DefaultOnResponse::new()
        .level(Level::DEBUG)
        .latency_unit(LatencyUnit::Millis);

    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(on_response)
}

/// Initialize the tracing subscriber; `RUST_LOG` wins over `log_level`
pub fn init_tracing(log_level: &str) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Log a start message for a significant operation
pub fn log_operation_start(operation: &str, details: Option<&str>) {
    match details {
        Some(details) => info!(operation, details, "Starting operation"),
        None => info!(operation, "Starting operation"),
    }
}

/// Log the completion of a significant operation
pub fn log_operation_end(operation: &str, start_time: Instant, success: bool) {
    let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;

    if success {
        info!(operation, duration_ms, "Operation completed successfully");
    } else {
        warn!(operation, duration_ms, "Operation completed with warnings");
    }
}

/// Run `f`, logging how long it took
pub fn log_timed_operation<F, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let request_id = Uuid::new_v4();

    debug!(operation, request_id = %request_id, "Starting operation");

    let result = f();

    info!(
        operation,
        request_id = %request_id,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Operation completed"
    );

    result
}

/// Log what was read from the input files
pub fn log_data_load_stats(
    values_path: &str,
    value_rows: usize,
    columns: &[&str],
    boundaries_path: &str,
    area_count: usize,
    crs: &str,
) {
    info!(
        operation = "data_load",
        values_path,
        value_rows,
        column_count = columns.len(),
        columns = %columns.join(", "),
        boundaries_path,
        area_count,
        crs,
        "Data loaded successfully"
    );
}

/// Log an error with context
pub fn log_error(error: &BandMapError, context: &str) {
    error!(
        error = %error,
        context,
        error_type = std::any::type_name_of_val(error),
        "Error occurred"
    );
}

/// Log an error that occurred during request processing
pub fn log_request_error(
    error: &BandMapError,
    endpoint: &str,
    request_id: &str,
    params: Option<&str>,
) {
    let status = error.status_code().as_u16();
    if status >= 500 {
        error!(
            error = %error,
            endpoint,
            request_id,
            status,
            params = params.unwrap_or("none"),
            "Request processing error"
        );
    } else {
        warn!(
            error = %error,
            endpoint,
            request_id,
            status,
            params = params.unwrap_or("none"),
            "Request rejected"
        );
    }
}

/// Generate a unique request ID
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}
