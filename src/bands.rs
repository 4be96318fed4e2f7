//! Colour band assignment.
//!
//! Turns a continuous numeric column into a finite, ordered set of labelled
//! half-open intervals. Boundaries follow `arange(v_min, v_max + step, step)`
//! and values are binned right-open, so a value equal to a boundary belongs
//! to the band that starts at that boundary.
//!
//! In diverging mode a narrow band of total width `step * 0.02` is carved out
//! around zero and displayed as `"0.0"`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{BandMapError, Result};

/// Half-width of the diverging zero band, as a fraction of the step size
pub const ZERO_BAND_FRACTION: f64 = 0.01;

/// Display label of the diverging zero band
pub const ZERO_BAND_LABEL: &str = "0.0";

/// Default variable name used in band labels
pub const DEFAULT_V_NAME: &str = "v";

/// Largest number of band boundaries a spec may produce
pub const MAX_BOUNDARIES: usize = 1000;

/// Decimal places tried, in order, until every label is unique
const LABEL_PRECISIONS: std::ops::RangeInclusive<usize> = 3..=12;

/// User-supplied band settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSpec {
    /// Lowest regular boundary
    pub v_min: f64,
    /// Highest regular boundary
    pub v_max: f64,
    /// Distance between consecutive boundaries
    pub step: f64,
    /// Whether to carve out a narrow band around zero
    #[serde(default)]
    pub diverging: bool,
    /// Variable name shown in labels
    #[serde(default = "default_v_name")]
    pub v_name: String,
}

impl BandSpec {
    /// Create a non-diverging band spec
    pub fn new(v_min: f64, v_max: f64, step: f64) -> Self {
        Self {
            v_min,
            v_max,
            step,
            diverging: false,
            v_name: default_v_name(),
        }
    }

    /// Switch diverging mode on or off
    pub fn with_diverging(mut self, diverging: bool) -> Self {
        self.diverging = diverging;
        self
    }

    /// Reject settings that cannot produce an ordered set of bands
    pub fn validate(&self) -> Result<()> {
        if !self.v_min.is_finite() || !self.v_max.is_finite() || !self.step.is_finite() {
            return Err(BandMapError::Config {
                message: format!(
                    "Band limits must be finite: v_min={}, v_max={}, step={}",
                    self.v_min, self.v_max, self.step
                ),
            });
        }
        if self.v_max <= self.v_min {
            return Err(BandMapError::Config {
                message: format!(
                    "v_max ({}) must be greater than v_min ({})",
                    self.v_max, self.v_min
                ),
            });
        }
        if self.step <= 0.0 {
            return Err(BandMapError::Config {
                message: format!("Step size must be positive, got {}", self.step),
            });
        }
        let count = (self.v_max - self.v_min) / self.step;
        if count > MAX_BOUNDARIES as f64 {
            return Err(BandMapError::Config {
                message: format!(
                    "v_min={}, v_max={}, step={} gives about {:.0} boundaries; at most {} are allowed",
                    self.v_min, self.v_max, self.step, count, MAX_BOUNDARIES
                ),
            });
        }
        Ok(())
    }

    /// Half-width of the zero band for this step size
    pub fn zero_size(&self) -> f64 {
        self.step * ZERO_BAND_FRACTION
    }
}

/// An ordered set of boundaries and the labels of the bands between them.
///
/// `labels.len() == boundaries.len() + 1`: the first label covers values
/// below the first boundary and the last covers values at or above the last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bands {
    /// Strictly increasing band boundaries
    pub boundaries: Vec<f64>,
    /// One label per band, in band order
    pub labels: Vec<String>,
    /// Index of the diverging zero band, if any
    pub zero_band: Option<usize>,
}

impl Bands {
    /// Build boundaries and labels from validated settings
    pub fn from_spec(spec: &BandSpec) -> Result<Self> {
        spec.validate()?;

        let mut boundaries = arange(spec.v_min, spec.v_max + spec.step, spec.step);
        let mut zero_band = None;

        if spec.diverging {
            let zero_size = spec.zero_size();
            if let Some(ind_z) = boundaries.iter().position(|b| b.abs() < zero_size) {
                boundaries.remove(ind_z);
            }
            let ind = boundaries
                .iter()
                .position(|b| *b >= 0.0)
                .unwrap_or(boundaries.len());
            boundaries.splice(ind..ind, [-zero_size, zero_size]);
            zero_band = Some(ind + 1);
        }

        let mut labels = make_labels(&boundaries, &spec.v_name);
        if let Some(index) = zero_band {
            labels[index] = ZERO_BAND_LABEL.to_string();
        }

        Ok(Self {
            boundaries,
            labels,
            zero_band,
        })
    }

    /// Number of bands
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no bands (never true for bands built from a spec)
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Right-open bin index of a value; `None` for NaN
    pub fn band_index(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        Some(self.boundaries.partition_point(|b| *b <= value))
    }

    /// Label of a band index
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Label for a value; `None` for NaN
    pub fn label_for(&self, value: f64) -> Option<&str> {
        self.band_index(value).and_then(|i| self.label(i))
    }

    /// Lower and upper bound of a band (infinite at the open ends)
    pub fn interval(&self, index: usize) -> Option<(f64, f64)> {
        if index >= self.len() {
            return None;
        }
        let lo = if index == 0 {
            f64::NEG_INFINITY
        } else {
            self.boundaries[index - 1]
        };
        let hi = self
            .boundaries
            .get(index)
            .copied()
            .unwrap_or(f64::INFINITY);
        Some((lo, hi))
    }
}

/// A value that received a band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandedValue {
    /// Area identifier
    pub area_id: String,
    /// Original value
    pub value: f64,
    /// Index into [`Bands::labels`]
    pub band: usize,
}

/// Result of banding a value series
#[derive(Debug, Clone, Serialize)]
pub struct BandAssignment {
    /// The band definition used
    pub bands: Bands,
    /// One row per non-NaN input value, in input order
    pub rows: Vec<BandedValue>,
    /// Number of NaN inputs left out
    pub excluded: usize,
}

impl BandAssignment {
    /// Label of a banded row
    pub fn label_of(&self, row: &BandedValue) -> &str {
        self.bands.label(row.band).unwrap_or_default()
    }

    /// Band indices that at least one row falls into
    pub fn present_bands(&self) -> BTreeSet<usize> {
        self.rows.iter().map(|row| row.band).collect()
    }
}

/// Assign a band to every non-NaN value.
///
/// Fails with [`BandMapError::Config`] when `v_max <= v_min` or `step <= 0`.
pub fn assign_bands<'a, I>(values: I, spec: &BandSpec) -> Result<BandAssignment>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let bands = Bands::from_spec(spec)?;
    let mut rows = Vec::new();
    let mut excluded = 0;

    for (area_id, value) in values {
        match bands.band_index(value) {
            Some(band) => rows.push(BandedValue {
                area_id: area_id.to_string(),
                value,
                band,
            }),
            None => excluded += 1,
        }
    }

    Ok(BandAssignment {
        bands,
        rows,
        excluded,
    })
}

/// `numpy.arange` with a tolerance against floating-point drift in the count
fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let count = ((stop - start) / step - 1e-9).ceil().max(0.0) as usize;
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Format band labels, widening the precision until no two boundaries print alike
fn make_labels(boundaries: &[f64], v_name: &str) -> Vec<String> {
    let precision = LABEL_PRECISIONS
        .clone()
        .find(|precision| {
            let printed: BTreeSet<String> = boundaries
                .iter()
                .map(|b| format!("{:.*}", *precision, b))
                .collect();
            printed.len() == boundaries.len()
        })
        .unwrap_or(*LABEL_PRECISIONS.end());
    format_labels(boundaries, v_name, precision)
}

fn format_labels(boundaries: &[f64], v_name: &str, precision: usize) -> Vec<String> {
    let (Some(first), Some(last)) = (boundaries.first(), boundaries.last()) else {
        return vec![format!("any {}", v_name)];
    };

    let mut labels = Vec::with_capacity(boundaries.len() + 1);
    labels.push(format!("{} < {:.*}", v_name, precision, first));
    for pair in boundaries.windows(2) {
        labels.push(format!(
            "{:.*} <= {} < {:.*}",
            precision, pair[0], v_name, precision, pair[1]
        ));
    }
    labels.push(format!("{:.*} <= {}", precision, last, v_name));
    labels
}

fn default_v_name() -> String {
    DEFAULT_V_NAME.to_string()
}
