//! Travel-time endpoint handler.
//!
//! Maps the travel time to one unit, or with `compare` the difference
//! `unit - compare` on a diverging scale.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::error_response;
use super::map::layers_body;
use super::params::{MapQuery, ResolvedBands};
use crate::error::Result;
use crate::logging::generate_request_id;
use crate::pipeline::{create_colour_layers, ColourLayers};
use crate::state::AppState;
use crate::travel::{time_difference, travel_time};

/// Layers for a travel time or a difference of travel times
pub(crate) fn travel_layers(
    state: &AppState,
    unit: &str,
    compare: Option<&str>,
    bands: &ResolvedBands,
) -> Result<Arc<ColourLayers>> {
    // unknown units fail here so they are never cached
    travel_time(&state.values, unit)?;
    if let Some(other) = compare {
        travel_time(&state.values, other)?;
    }
    let join_on = state.config.data.join_on;

    state
        .layer_cache
        .get_or_try_insert("travel_layers", &(unit, compare, bands, join_on), || {
            let values = match compare {
                Some(other) => time_difference(&state.values, unit, other)?,
                None => travel_time(&state.values, unit)?.to_vec(),
            };
            let series = state
                .values
                .ids
                .iter()
                .map(String::as_str)
                .zip(values.iter().copied());
            create_colour_layers(
                series,
                &state.boundaries,
                join_on,
                &bands.spec,
                &bands.cmap,
            )
        })
}

/// Title shown with the colour bar
pub(crate) fn travel_title(unit: &str, compare: Option<&str>) -> String {
    match compare {
        Some(other) => format!("Time benefit of {} over {} (minutes)", other, unit),
        None => format!("Time to {} (minutes)", unit),
    }
}

/// Handle GET /travel requests
pub async fn travel_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapQuery>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();

    debug!(
        endpoint = "/travel",
        request_id = %request_id,
        unit = ?params.unit,
        compare = ?params.compare,
        "Processing travel request"
    );

    match build_travel(&state, &params) {
        Ok((title, layers)) => {
            info!(
                endpoint = "/travel",
                request_id = %request_id,
                layer_count = layers.layers.len(),
                duration_ms = start_time.elapsed().as_secs_f64() * 1000.0,
                "Travel request successful"
            );
            Json(layers_body(&state, &title, &layers)).into_response()
        }
        Err(error) => error_response(&error, "/travel", &request_id, Some(&params.describe())),
    }
}

fn build_travel(state: &AppState, params: &MapQuery) -> Result<(String, Arc<ColourLayers>)> {
    let unit = params.require_unit()?;
    let compare = params.compare.as_deref();
    let bands = params.resolve_bands(&state.config.bands, compare.is_some())?;
    let layers = travel_layers(state, unit, compare, &bands)?;
    Ok((travel_title(unit, compare), layers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_title() {
        assert_eq!(travel_title("LE15WW", None), "Time to LE15WW (minutes)");
        assert_eq!(
            travel_title("LE15WW", Some("TA15DA")),
            "Time benefit of TA15DA over LE15WW (minutes)"
        );
    }
}
