//! HTTP request handlers for the bandmap API.
//!
//! This module contains all the endpoint handlers for the web server.

pub mod bands;
pub mod heartbeat;
pub mod map;
pub mod metadata;
pub mod params;
pub mod raster;
pub mod travel;

pub use bands::bands_handler;
pub use heartbeat::heartbeat_handler;
pub use map::map_handler;
pub use metadata::metadata_handler;
pub use raster::raster_handler;
pub use travel::travel_handler;

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::error::BandMapError;
use crate::logging::log_request_error;

/// Log a failed request and turn it into a JSON error body
pub(crate) fn error_response(
    error: &BandMapError,
    endpoint: &str,
    request_id: &str,
    params: Option<&str>,
) -> Response {
    log_request_error(error, endpoint, request_id, params);
    (
        error.status_code(),
        Json(serde_json::json!({
            "error": error.to_string(),
            "request_id": request_id,
        })),
    )
        .into_response()
}
