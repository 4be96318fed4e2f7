//! Application state shared by all handlers.
//!
//! Everything except the caches is immutable after startup.

use std::sync::Arc;
use std::time::Instant;

use crate::cache::MemoCache;
use crate::config::Config;
use crate::data_loader::{BoundaryLayer, ValueTable};
use crate::error::{BandMapError, Result};
use crate::pipeline::ColourLayers;

/// The main application state shared across all handlers
#[derive(Debug)]
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// Per-area values
    pub values: ValueTable,
    /// Area boundaries in British National Grid
    pub boundaries: BoundaryLayer,
    /// Colour layers by request parameters
    pub layer_cache: MemoCache<ColourLayers>,
    /// Encoded PNGs by request parameters
    pub image_cache: MemoCache<Vec<u8>>,
    /// When the state was built
    pub started: Instant,
}

impl AppState {
    /// Create a new AppState
    pub fn new(config: Config, values: ValueTable, boundaries: BoundaryLayer) -> Self {
        Self {
            config,
            values,
            boundaries,
            layer_cache: MemoCache::new(),
            image_cache: MemoCache::new(),
            started: Instant::now(),
        }
    }

    /// Create a new AppState wrapped in an Arc for shared ownership
    pub fn new_shared(config: Config, values: ValueTable, boundaries: BoundaryLayer) -> Arc<Self> {
        Arc::new(Self::new(config, values, boundaries))
    }

    /// `(area id, value)` pairs of a value column
    pub fn series(&self, column: &str) -> Result<Vec<(&str, f64)>> {
        self.values.series(column)
    }

    /// Validate that the state is ready to serve
    pub fn validate(&self) -> Result<()> {
        if self.values.columns.is_empty() {
            return Err(BandMapError::DataNotFound {
                message: "Values file has no value columns".to_string(),
            });
        }
        if self.boundaries.is_empty() {
            return Err(BandMapError::DataNotFound {
                message: "Boundary file has no polygon areas".to_string(),
            });
        }
        if !self.boundaries.crs.is_projected() {
            return Err(BandMapError::Crs {
                message: format!(
                    "Boundaries must be held in a projected CRS, not {}",
                    self.boundaries.crs
                ),
            });
        }
        Ok(())
    }
}
