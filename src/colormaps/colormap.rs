//! Colormap trait and utilities.
//!
//! This module defines the common interface for all colormaps and the
//! name lookup that resolves `viridis`, `RdBu_r` and friends.

use colorgrad::Gradient;
use serde::{Serialize, Serializer};

use crate::error::{BandMapError, Result};

/// An RGBA colour with channels in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colour {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Colour {
    pub const TRANSPARENT: Colour = Colour {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Create a colour from 8-bit channels
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: a as f64 / 255.0,
        }
    }

    /// 8-bit RGBA channels
    pub fn to_rgba8(&self) -> [u8; 4] {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            channel(self.r),
            channel(self.g),
            channel(self.b),
            channel(self.a),
        ]
    }

    /// `#rrggbb` hex string (alpha dropped)
    pub fn to_hex(&self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    /// `rgba(r,g,b,a)` with fractional channels, the form plotting front ends accept
    pub fn to_rgba_string(&self) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

impl From<colorgrad::Color> for Colour {
    fn from(color: colorgrad::Color) -> Self {
        Self {
            r: color.r,
            g: color.g,
            b: color.b,
            a: color.a,
        }
    }
}

impl Serialize for Colour {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr {
            rgba: String,
            hex: String,
        }
        Repr {
            rgba: self.to_rgba_string(),
            hex: self.to_hex(),
        }
        .serialize(serializer)
    }
}

/// Trait for color mapping implementations
pub trait Colormap: Send + Sync {
    /// Map a normalized value (0.0 to 1.0) to a colour
    fn map_normalized(&self, value: f64) -> Colour;

    /// Map a value to a colour given the data range
    fn map(&self, value: f64, min: f64, max: f64) -> Colour {
        let normalized = if max > min {
            ((value - min) / (max - min)).clamp(0.0, 1.0)
        } else {
            0.5
        };
        self.map_normalized(normalized)
    }

    /// Get the name of this colormap
    fn name(&self) -> &str;
}

/// Number of samples taken from a gradient when building its lookup table
pub const TABLE_SIZE: usize = 256;

/// A colormap backed by a lookup table sampled from a `colorgrad` gradient
pub struct SampledColormap {
    name: String,
    table: Vec<Colour>,
}

impl SampledColormap {
    /// Sample `gradient` into a table, reversing it if requested
    pub fn new(name: impl Into<String>, gradient: &Gradient, reversed: bool) -> Self {
        let mut table: Vec<Colour> = (0..TABLE_SIZE)
            .map(|i| Colour::from(gradient.at(i as f64 / (TABLE_SIZE - 1) as f64)))
            .collect();
        if reversed {
            table.reverse();
        }
        Self {
            name: name.into(),
            table,
        }
    }
}

impl Colormap for SampledColormap {
    fn map_normalized(&self, value: f64) -> Colour {
        let last = self.table.len() - 1;
        let position = value.clamp(0.0, 1.0) * last as f64;
        let index = position.floor() as usize;
        if index >= last {
            return self.table[last];
        }

        let t = position - index as f64;
        lerp_colour(self.table[index], self.table[index + 1], t)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Linear interpolation between two colours
pub fn lerp_colour(c1: Colour, c2: Colour, t: f64) -> Colour {
    if t == 0.0 {
        return c1;
    }
    Colour {
        r: c1.r * (1.0 - t) + c2.r * t,
        g: c1.g * (1.0 - t) + c2.g * t,
        b: c1.b * (1.0 - t) + c2.b * t,
        a: c1.a * (1.0 - t) + c2.a * t,
    }
}

/// Get a colormap by name.
///
/// Names are matched case-insensitively with `_` and `-` ignored, so
/// `RdBu`, `rd_bu` and `rdbu` are the same map. A trailing `_r` reverses
/// the map. A doubled `_r_r`, as produced by appending `_r` to a name that
/// already had one, is read as a single `_r`.
pub fn get_colormap(name: &str) -> Result<Box<dyn Colormap>> {
    use super::{diverging, sequential};

    let (base, reversed) = split_reversal(name);
    let key = normalize_key(base);

    let gradient = sequential::gradient(&key)
        .or_else(|| diverging::gradient(&key))
        .ok_or_else(|| BandMapError::InvalidParameter {
            param: "cmap".to_string(),
            message: format!("Unknown colormap: {}", name),
        })?;

    Ok(Box::new(SampledColormap::new(name, &gradient, reversed)))
}

/// Names accepted by [`get_colormap`], without reversal suffixes
pub fn available_colormaps() -> Vec<&'static str> {
    super::sequential::NAMES
        .iter()
        .chain(super::diverging::NAMES.iter())
        .copied()
        .collect()
}

fn split_reversal(name: &str) -> (&str, bool) {
    let name = match name.strip_suffix("_r") {
        Some(rest) if rest.ends_with("_r") => rest,
        _ => name,
    };
    match name.strip_suffix("_r") {
        Some(base) => (base, true),
        None => (name, false),
    }
}

fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}
