//! Query parameters shared by the map endpoints.

use serde::{Deserialize, Serialize};

use crate::bands::BandSpec;
use crate::config::BandDefaults;
use crate::error::{BandMapError, Result};

/// Query string of `/bands`, `/map`, `/raster` and `/travel`.
///
/// Band settings left out fall back to the configured defaults for the
/// chosen mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapQuery {
    /// Value column to map
    pub column: Option<String>,
    /// Travel-time unit
    pub unit: Option<String>,
    /// Second unit; maps `unit - compare` when given
    pub compare: Option<String>,
    pub v_min: Option<f64>,
    pub v_max: Option<f64>,
    pub step: Option<f64>,
    pub diverging: Option<bool>,
    /// Colormap name, `_r` suffix reverses
    pub cmap: Option<String>,
    /// Raster pixel size in metres
    pub pixel_size: Option<f64>,
}

/// Fully resolved band settings, also used as a cache key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBands {
    pub spec: BandSpec,
    pub cmap: String,
}

impl MapQuery {
    /// Band settings with defaults filled in.
    ///
    /// `diverging_default` picks the mode when the query does not.
    pub fn resolve_bands(&self, defaults: &BandDefaults, diverging_default: bool) -> Result<ResolvedBands> {
        let diverging = self.diverging.unwrap_or(diverging_default);
        let fallback = defaults.for_mode(diverging);

        let spec = BandSpec::new(
            self.v_min.unwrap_or(fallback.v_min),
            self.v_max.unwrap_or(fallback.v_max),
            self.step.unwrap_or(fallback.step),
        )
        .with_diverging(diverging);

        spec.validate().map_err(|e| BandMapError::InvalidParameter {
            param: "v_min/v_max/step".to_string(),
            message: e.to_string(),
        })?;

        Ok(ResolvedBands {
            spec,
            cmap: self.cmap.clone().unwrap_or_else(|| fallback.cmap.clone()),
        })
    }

    /// The value column, required
    pub fn require_column(&self) -> Result<&str> {
        require(self.column.as_deref(), "column")
    }

    /// The travel-time unit, required
    pub fn require_unit(&self) -> Result<&str> {
        require(self.unit.as_deref(), "unit")
    }

    /// Short description for error logs
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        let mut push = |name: &str, value: Option<String>| {
            if let Some(value) = value {
                parts.push(format!("{}={}", name, value));
            }
        };
        push("column", self.column.clone());
        push("unit", self.unit.clone());
        push("compare", self.compare.clone());
        push("v_min", self.v_min.map(|v| v.to_string()));
        push("v_max", self.v_max.map(|v| v.to_string()));
        push("step", self.step.map(|v| v.to_string()));
        push("diverging", self.diverging.map(|v| v.to_string()));
        push("cmap", self.cmap.clone());
        push("pixel_size", self.pixel_size.map(|v| v.to_string()));
        parts.join("&")
    }
}

fn require<'a>(value: Option<&'a str>, param: &str) -> Result<&'a str> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(BandMapError::InvalidParameter {
            param: param.to_string(),
            message: "parameter is required".to_string(),
        }),
    }
}
