//! Raster image endpoint handler.
//!
//! Burns the colour layers of a value column (or of a travel time when
//! `unit` is given) into a PNG on the British National Grid.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::error_response;
use super::map::column_layers;
use super::params::MapQuery;
use super::travel::travel_layers;
use crate::error::{BandMapError, Result};
use crate::logging::generate_request_id;
use crate::raster::{rasterize, render_png, total_bounds, GridSpec};
use crate::state::AppState;

/// Handle GET /raster requests
pub async fn raster_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapQuery>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();

    debug!(
        endpoint = "/raster",
        request_id = %request_id,
        column = ?params.column,
        unit = ?params.unit,
        pixel_size = ?params.pixel_size,
        "Processing raster request"
    );

    match build_raster(&state, &params) {
        Ok(png) => {
            info!(
                endpoint = "/raster",
                request_id = %request_id,
                bytes = png.len(),
                duration_ms = start_time.elapsed().as_secs_f64() * 1000.0,
                "Raster request successful"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, HeaderValue::from_static("image/png"))],
                png.to_vec(),
            )
                .into_response()
        }
        Err(error) => error_response(&error, "/raster", &request_id, Some(&params.describe())),
    }
}

fn build_raster(state: &AppState, params: &MapQuery) -> Result<Arc<Vec<u8>>> {
    let pixel_size = params.pixel_size.unwrap_or(state.config.raster.pixel_size);
    let compare = params.compare.as_deref();

    let (source, layers) = match params.unit.as_deref() {
        Some(unit) => {
            let bands = params.resolve_bands(&state.config.bands, compare.is_some())?;
            let layers = travel_layers(state, unit, compare, &bands)?;
            ((Some(unit), compare, None, bands), layers)
        }
        None => {
            let column = params.require_column()?;
            let bands = params.resolve_bands(&state.config.bands, false)?;
            let layers = column_layers(state, column, &bands)?;
            ((None, None, Some(column), bands), layers)
        }
    };

    let bounds = total_bounds(layers.layers.iter().map(|layer| &layer.geometry)).ok_or_else(
        || BandMapError::DataNotFound {
            message: "No areas have values to rasterize".to_string(),
        },
    )?;
    let spec = GridSpec::covering(bounds, pixel_size)?;
    let max_pixels = state.config.raster.max_pixels;
    if spec.pixel_count() > max_pixels {
        return Err(BandMapError::InvalidParameter {
            param: "pixel_size".to_string(),
            message: format!(
                "{}x{} pixels exceeds the limit of {}; use a larger pixel size",
                spec.width, spec.height, max_pixels
            ),
        });
    }

    state
        .image_cache
        .get_or_try_insert("raster", &(&source, pixel_size), || {
            let grid = rasterize(
                layers.layers.iter().map(|layer| (layer.band, &layer.geometry)),
                spec,
            );
            render_png(&grid, &layers.colours)
        })
}
