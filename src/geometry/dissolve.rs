//! Polygon repair and dissolve-by-label.
//!
//! Every area polygon is repaired before it takes part in a union, then all
//! polygons that share a band label are merged into one geometry. An area
//! whose geometry cannot be repaired is dropped with a warning; the rest of
//! the map still renders.

use geo::{Area, BooleanOps, Coord, LineString, MultiPolygon, Polygon};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::crs::Crs;
use crate::error::{BandMapError, Result};

/// An area geometry with the band it was assigned
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledGeometry {
    /// Area identifier (e.g. LSOA code)
    pub area_id: String,
    /// Area outline
    pub geometry: MultiPolygon<f64>,
    /// Coordinate reference system of `geometry`
    pub crs: Crs,
    /// Band index and label; `None` for areas without a value
    pub band: Option<BandKey>,
}

/// Band index and display label
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BandKey {
    /// Position of the band in [`crate::bands::Bands::labels`]; orders regions
    pub index: usize,
    /// Text shown in the legend
    pub label: String,
}

/// The union of all areas sharing one band
#[derive(Debug, Clone, PartialEq)]
pub struct DissolvedRegion {
    /// Band shared by every member
    pub band: BandKey,
    /// Union of the members' repaired geometries
    pub geometry: MultiPolygon<f64>,
    /// Areas merged into this region, in input order
    pub members: Vec<String>,
}

/// Dissolve result plus what was left out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DissolveOutput {
    /// One region per band present in the input, in band order
    pub regions: Vec<DissolvedRegion>,
    /// Areas dropped because their geometry could not be repaired
    pub dropped: Vec<String>,
    /// Areas skipped because they had no band
    pub unlabelled: usize,
}

/// Merge the geometries of all records that share a band.
///
/// All records must use the same projected CRS; union in degrees is
/// meaningless, so geographic or mixed input fails with
/// [`BandMapError::Crs`] before any geometry is touched.
pub fn dissolve_by_label(records: &[LabelledGeometry]) -> Result<DissolveOutput> {
    check_crs(records)?;

    let mut groups: BTreeMap<BandKey, (Vec<MultiPolygon<f64>>, Vec<String>)> = BTreeMap::new();
    let mut output = DissolveOutput::default();

    for record in records {
        let Some(band) = &record.band else {
            output.unlabelled += 1;
            continue;
        };
        match repair(&record.geometry) {
            Some(geometry) => {
                let (parts, members) = groups.entry(band.clone()).or_default();
                parts.push(geometry);
                members.push(record.area_id.clone());
            }
            None => {
                warn!(
                    area_id = %record.area_id,
                    band = %band.label,
                    "Dropping geometry that could not be repaired"
                );
                output.dropped.push(record.area_id.clone());
            }
        }
    }

    for (band, (parts, members)) in groups {
        debug!(band = %band.label, areas = members.len(), "Dissolving band");
        output.regions.push(DissolvedRegion {
            band,
            geometry: union_all(parts),
            members,
        });
    }

    Ok(output)
}

/// Reject geographic or mixed coordinate systems
fn check_crs(records: &[LabelledGeometry]) -> Result<()> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    if let Some(other) = records.iter().find(|r| r.crs != first.crs) {
        return Err(BandMapError::Crs {
            message: format!(
                "Cannot dissolve across coordinate systems: {} ({}) and {} ({})",
                first.crs, first.area_id, other.crs, other.area_id
            ),
        });
    }
    if !first.crs.is_projected() {
        return Err(BandMapError::Crs {
            message: format!(
                "Cannot dissolve in geographic coordinates ({}); reproject to a planar system first",
                first.crs
            ),
        });
    }
    Ok(())
}

/// Repair a possibly invalid geometry.
///
/// Non-finite coordinates and degenerate rings are removed, rings are
/// closed, and self-intersections are resolved by an overlay pass.
/// Returns `None` when nothing with positive area is left.
pub fn repair(geometry: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    let empty = MultiPolygon::new(Vec::new());
    let pieces: Vec<MultiPolygon<f64>> = geometry
        .iter()
        .filter_map(clean_polygon)
        .map(|polygon| MultiPolygon::new(vec![polygon]).union(&empty))
        .filter(|piece| !piece.0.is_empty())
        .collect();

    let repaired = union_all(pieces);
    if repaired.0.is_empty() || repaired.unsigned_area() <= 0.0 {
        None
    } else {
        Some(repaired)
    }
}

/// Union many geometries by pairwise reduction, keeping operands similar in size
pub fn union_all(mut parts: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    while parts.len() > 1 {
        let mut merged = Vec::with_capacity(parts.len().div_ceil(2));
        let mut iter = parts.into_iter();
        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => merged.push(a.union(&b)),
                None => merged.push(a),
            }
        }
        parts = merged;
    }
    parts
        .pop()
        .unwrap_or_else(|| MultiPolygon::new(Vec::new()))
}

fn clean_polygon(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let exterior = clean_ring(polygon.exterior())?;
    let interiors = polygon.interiors().iter().filter_map(clean_ring).collect();
    Some(Polygon::new(exterior, interiors))
}

fn clean_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> = ring
        .0
        .iter()
        .copied()
        .filter(|c| c.x.is_finite() && c.y.is_finite())
        .collect();
    coords.dedup();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < 3 {
        return None;
    }
    coords.push(coords[0]);
    Some(LineString::new(coords))
}
