//! Metadata endpoint handler.
//!
//! Returns JSON describing the loaded boundaries, the value columns and
//! the colormaps a client can ask for.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::colormaps::available_colormaps;
use crate::logging::generate_request_id;
use crate::schema::{JoinKey, PropertyNames, RegionType};
use crate::state::AppState;

/// Summary of one value column
#[derive(Debug, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    /// Finite values
    pub count: usize,
    /// NaN or unparseable cells
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Metadata response structure
#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    pub region_type: RegionType,
    pub properties: PropertyNames,
    pub crs: String,
    pub area_count: usize,
    pub skipped_features: usize,
    /// `[x_min, y_min, x_max, y_max]`
    pub bounds: Option<[f64; 4]>,
    pub id_column: String,
    pub join_on: JoinKey,
    pub columns: Vec<ColumnSummary>,
    pub colormaps: Vec<&'static str>,
}

/// Handle GET /metadata requests
pub async fn metadata_handler(State(state): State<Arc<AppState>>) -> Json<MetadataResponse> {
    let request_id = generate_request_id();
    let start_time = Instant::now();

    debug!(
        endpoint = "/metadata",
        request_id = %request_id,
        "Processing metadata request"
    );

    let response = metadata(&state);

    info!(
        endpoint = "/metadata",
        request_id = %request_id,
        duration_us = start_time.elapsed().as_micros() as u64,
        area_count = response.area_count,
        column_count = response.columns.len(),
        "Metadata request successful"
    );

    Json(response)
}

fn metadata(state: &AppState) -> MetadataResponse {
    let columns = state
        .values
        .columns
        .iter()
        .map(|(name, values)| summarise(name, values))
        .collect();

    MetadataResponse {
        region_type: state.boundaries.region_type,
        properties: state.boundaries.properties.clone(),
        crs: state.boundaries.crs.to_string(),
        area_count: state.boundaries.len(),
        skipped_features: state.boundaries.skipped,
        bounds: state
            .boundaries
            .bounds()
            .map(|r| [r.min().x, r.min().y, r.max().x, r.max().y]),
        id_column: state.values.id_column.clone(),
        join_on: state.config.data.join_on,
        columns,
        colormaps: available_colormaps(),
    }
}

fn summarise(name: &str, values: &[f64]) -> ColumnSummary {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    ColumnSummary {
        name: name.to_string(),
        count: finite.len(),
        missing: values.len() - finite.len(),
        min: finite.iter().copied().reduce(f64::min),
        max: finite.iter().copied().reduce(f64::max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarise_skips_nan() {
        let summary = summarise("time", &[3.0, f64::NAN, -1.0, 7.5]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.min, Some(-1.0));
        assert_eq!(summary.max, Some(7.5));

        let empty = summarise("none", &[f64::NAN]);
        assert_eq!(empty.min, None);
    }
}
