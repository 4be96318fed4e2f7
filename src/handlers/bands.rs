//! Band legend endpoint handler.
//!
//! Returns the boundaries, labels and colours for a band setting without
//! touching any geometry.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::error_response;
use super::params::MapQuery;
use crate::bands::{BandSpec, Bands};
use crate::colormaps::{colour_scale, colourbar_swatches, make_colour_map, ColourMap, ColourScale};
use crate::config::BandDefaults;
use crate::error::Result;
use crate::logging::generate_request_id;
use crate::state::AppState;

/// Number of preview colours returned with every legend
const SWATCH_COUNT: usize = 15;

/// Response body of `/bands`
#[derive(Debug, Serialize)]
pub struct BandsResponse {
    pub spec: BandSpec,
    pub cmap: String,
    pub boundaries: Vec<f64>,
    pub labels: Vec<String>,
    pub zero_band: Option<usize>,
    pub colours: ColourMap,
    pub scale: ColourScale,
    pub swatches: Vec<String>,
}

/// Handle GET /bands requests
pub async fn bands_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MapQuery>,
) -> Response {
    let request_id = generate_request_id();
    debug!(endpoint = "/bands", request_id = %request_id, "Processing bands request");

    match build_bands(&state.config.bands, &params) {
        Ok(response) => Json(response).into_response(),
        Err(error) => error_response(&error, "/bands", &request_id, Some(&params.describe())),
    }
}

fn build_bands(defaults: &BandDefaults, params: &MapQuery) -> Result<BandsResponse> {
    let resolved = params.resolve_bands(defaults, false)?;
    let bands = Bands::from_spec(&resolved.spec)?;
    let colours = make_colour_map(&bands.labels, &resolved.cmap)?;
    let scale = colour_scale(&bands, &resolved.spec, &colours);
    let swatches = colourbar_swatches(&resolved.cmap, SWATCH_COUNT)?;

    Ok(BandsResponse {
        spec: resolved.spec,
        cmap: resolved.cmap,
        boundaries: bands.boundaries,
        labels: bands.labels,
        zero_band: bands.zero_band,
        colours,
        scale,
        swatches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BandMapError;

    #[test]
    fn test_default_bands() {
        let response = build_bands(&BandDefaults::default(), &MapQuery::default()).unwrap();
        assert_eq!(response.boundaries, vec![0.0, 30.0, 60.0, 90.0, 120.0]);
        assert_eq!(response.labels.len(), 6);
        assert_eq!(response.colours.len(), 6);
        assert_eq!(response.swatches.len(), SWATCH_COUNT);
        assert_eq!(response.zero_band, None);
    }

    #[test]
    fn test_diverging_bands() {
        let params = MapQuery {
            diverging: Some(true),
            ..Default::default()
        };
        let response = build_bands(&BandDefaults::default(), &params).unwrap();
        let zero = response.zero_band.unwrap();
        assert_eq!(response.labels[zero], "0.0");
        assert_eq!(response.cmap, "rd_bu");
    }

    #[test]
    fn test_unknown_colormap() {
        let params = MapQuery {
            cmap: Some("sparkles".to_string()),
            ..Default::default()
        };
        let err = build_bands(&BandDefaults::default(), &params).unwrap_err();
        assert!(matches!(err, BandMapError::InvalidParameter { .. }));
    }
}
