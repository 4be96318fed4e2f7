//! Colour layer endpoint handler.
//!
//! Returns one dissolved, flattened layer per colour band for a value
//! column, with the legend needed to draw it.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::error_response;
use super::params::{MapQuery, ResolvedBands};
use crate::error::Result;
use crate::logging::generate_request_id;
use crate::pipeline::{create_colour_layers, ColourLayers};
use crate::state::AppState;

/// Layers for a value column, served from the cache when possible
pub(crate) fn column_layers(
    state: &AppState,
    column: &str,
    bands: &ResolvedBands,
) -> Result<Arc<ColourLayers>> {
    // unknown columns fail here so they are never cached
    state.values.column(column)?;
    let join_on = state.config.data.join_on;

    state
        .layer_cache
        .get_or_try_insert("column_layers", &(column, bands, join_on), || {
            create_colour_layers(
                state.series(column)?,
                &state.boundaries,
                join_on,
                &bands.spec,
                &bands.cmap,
            )
        })
}

/// JSON body shared by `/map` and `/travel`
pub(crate) fn layers_body(state: &AppState, title: &str, layers: &ColourLayers) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "region_type": state.boundaries.region_type,
        "crs": state.boundaries.crs.to_string(),
        "labels": layers.bands.labels,
        "boundaries": layers.bands.boundaries,
        "colours": layers.colours,
        "scale": layers.scale,
        "layers": layers.layers,
        "unmatched": layers.unmatched,
        "dropped": layers.dropped,
        "excluded": layers.excluded,
    })
}

/// Handle GET /map requests
pub async fn map_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapQuery>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();

    debug!(
        endpoint = "/map",
        request_id = %request_id,
        column = ?params.column,
        "Processing map request"
    );

    match build_map(&state, &params) {
        Ok((column, layers)) => {
            info!(
                endpoint = "/map",
                request_id = %request_id,
                column = %column,
                layer_count = layers.layers.len(),
                duration_ms = start_time.elapsed().as_secs_f64() * 1000.0,
                "Map request successful"
            );
            Json(layers_body(&state, &column, &layers)).into_response()
        }
        Err(error) => error_response(&error, "/map", &request_id, Some(&params.describe())),
    }
}

fn build_map(state: &AppState, params: &MapQuery) -> Result<(String, Arc<ColourLayers>)> {
    let column = params.require_column()?;
    let bands = params.resolve_bands(&state.config.bands, false)?;
    let layers = column_layers(state, column, &bands)?;
    Ok((column.to_string(), layers))
}
