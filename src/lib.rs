//! # bandmap
//!
//! Colour-banded choropleth layers for small-area geography.
//!
//! Per-area values are cut into labelled bands, areas that share a band
//! are dissolved into one geometry, and the result is flattened into
//! `x`/`y` arrays a plotting front end can draw as filled traces. The same
//! layers can be burned into a PNG raster.
//!
//! ## Architecture
//!
//! - **Core**: [`bands`], [`colormaps`], [`geometry`] and [`pipeline`]
//!   are synchronous and free of I/O
//! - **Data layer**: [`data_loader`] reads the values CSV and boundary
//!   GeoJSON once at startup
//! - **API layer**: [`handlers`] serve bands, layers and rasters over HTTP,
//!   memoized in [`cache`]

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod bands;
pub mod cache;
pub mod colormaps;
pub mod config;
pub mod data_loader;
pub mod error;
pub mod geometry;
pub mod handlers;
pub mod logging;
pub mod pipeline;
pub mod raster;
pub mod schema;
pub mod state;
pub mod travel;

pub use bands::{assign_bands, BandAssignment, BandSpec, Bands};
pub use config::Config;
pub use error::{BandMapError, Result};
pub use logging::{
    create_http_trace_layer, generate_request_id, init_tracing, log_data_load_stats, log_error,
    log_operation_end, log_operation_start, log_request_error, log_timed_operation,
};
pub use pipeline::{create_colour_layers, ColourLayer, ColourLayers};
pub use state::AppState;

/// The HTTP router with every endpoint mounted
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/heartbeat", get(handlers::heartbeat_handler))
        .route("/metadata", get(handlers::metadata_handler))
        .route("/bands", get(handlers::bands_handler))
        .route("/map", get(handlers::map_handler))
        .route("/raster", get(handlers::raster_handler))
        .route("/travel", get(handlers::travel_handler))
        .layer(create_http_trace_layer())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
