//! Band colours and discrete colour scales.
//!
//! A [`ColourMap`] gives every band label one colour, sampled evenly across a
//! named colormap so neighbouring bands get neighbouring colours. A
//! [`ColourScale`] lays the same colours out as a stepped colour bar.

use serde::Serialize;

use super::colormap::{get_colormap, Colour};
use crate::bands::{BandSpec, Bands};
use crate::error::Result;

/// Ordered mapping from band label to colour
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColourMap {
    /// Colormap the colours were sampled from
    pub cmap_name: String,
    /// One entry per label, in band order
    pub entries: Vec<ColourEntry>,
}

/// A single label/colour pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColourEntry {
    pub label: String,
    pub colour: Colour,
}

impl ColourMap {
    /// Colour of a label
    pub fn get(&self, label: &str) -> Option<Colour> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.colour)
    }

    /// Colour of the band at `index`
    pub fn colour_at(&self, index: usize) -> Option<Colour> {
        self.entries.get(index).map(|entry| entry.colour)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the first and last colours to emphasise out-of-range values
    pub fn with_under_over(mut self, under: Colour, over: Colour) -> Self {
        if let Some(first) = self.entries.first_mut() {
            first.colour = under;
        }
        if let Some(last) = self.entries.last_mut() {
            last.colour = over;
        }
        self
    }
}

/// Sample `labels.len()` evenly spaced colours from `cmap_name`.
pub fn make_colour_map(labels: &[String], cmap_name: &str) -> Result<ColourMap> {
    let cmap = get_colormap(cmap_name)?;
    let n = labels.len();

    let entries = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let t = if n > 1 {
                i as f64 / (n - 1) as f64
            } else {
                0.0
            };
            ColourEntry {
                label: label.clone(),
                colour: cmap.map_normalized(t),
            }
        })
        .collect();

    Ok(ColourMap {
        cmap_name: cmap_name.to_string(),
        entries,
    })
}

/// A position on the colour bar and the colour that starts or ends there
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColourStop {
    pub position: f64,
    pub colour: Colour,
}

/// Stepped colour bar: each band colour spans its normalised interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColourScale {
    /// Band edges normalised to `[0, 1]`, with one extra step at each end
    pub bounds: Vec<f64>,
    /// Two stops per band so no gradient forms between bands
    pub stops: Vec<ColourStop>,
}

/// Build the stepped colour bar for a set of bands.
///
/// The open-ended first and last bands are drawn one step wide.
pub fn colour_scale(bands: &Bands, spec: &BandSpec, colours: &ColourMap) -> ColourScale {
    let mut edges = Vec::with_capacity(bands.boundaries.len() + 2);
    edges.push(spec.v_min - spec.step);
    edges.extend_from_slice(&bands.boundaries);
    edges.push(spec.v_max + spec.step);

    let lo = edges.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = edges.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    let bounds: Vec<f64> = edges
        .iter()
        .map(|v| if span > 0.0 { (v - lo) / span } else { 0.0 })
        .collect();

    let mut stops = Vec::with_capacity(colours.len() * 2);
    for (i, entry) in colours.entries.iter().enumerate() {
        if i + 1 >= bounds.len() {
            break;
        }
        stops.push(ColourStop {
            position: bounds[i],
            colour: entry.colour,
        });
        stops.push(ColourStop {
            position: bounds[i + 1],
            colour: entry.colour,
        });
    }

    ColourScale { bounds, stops }
}

/// `n` hex colours previewing a colormap, for legends and pickers
pub fn colourbar_swatches(cmap_name: &str, n: usize) -> Result<Vec<String>> {
    let cmap = get_colormap(cmap_name)?;
    Ok((0..n)
        .map(|i| {
            let t = if n > 1 {
                i as f64 / (n - 1) as f64
            } else {
                0.0
            };
            cmap.map_normalized(t).to_hex()
        })
        .collect())
}
