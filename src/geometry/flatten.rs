//! Flatten polygon geometries into parallel x/y arrays.
//!
//! Line and fill renderers take one long coordinate list per trace and
//! lift the pen at a gap. A gap is `None` in both arrays and serializes
//! to JSON `null`. Coordinates on either side of a gap belong to
//! different rings and must never be joined.

use geo::{Geometry, LineString, MultiPolygon, Polygon};
use serde::Serialize;

use crate::error::{BandMapError, Result};

/// Parallel coordinate arrays with `None` gaps
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatCoords {
    /// Eastings (or longitudes), `None` at each gap
    pub x: Vec<Option<f64>>,
    /// Northings (or latitudes), `None` at the same positions as `x`
    pub y: Vec<Option<f64>>,
}

impl FlatCoords {
    /// Empty arrays
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, gaps included
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Append every coordinate of a ring
    pub fn push_ring(&mut self, ring: &LineString<f64>) {
        self.x.reserve(ring.0.len());
        self.y.reserve(ring.0.len());
        for coord in ring.coords() {
            self.x.push(Some(coord.x));
            self.y.push(Some(coord.y));
        }
    }

    /// Append a gap
    pub fn push_gap(&mut self) {
        self.x.push(None);
        self.y.push(None);
    }

    fn ends_with_gap(&self) -> bool {
        matches!(self.x.last(), Some(None))
    }

    /// Number of gap markers
    pub fn gap_count(&self) -> usize {
        self.x.iter().filter(|v| v.is_none()).count()
    }

    /// Split back into rings at each gap
    pub fn split_rings(&self) -> Vec<Vec<(f64, f64)>> {
        let mut rings = Vec::new();
        let mut current = Vec::new();
        for (x, y) in self.x.iter().zip(self.y.iter()) {
            match (x, y) {
                (Some(x), Some(y)) => current.push((*x, *y)),
                _ => {
                    if !current.is_empty() {
                        rings.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            rings.push(current);
        }
        rings
    }

    /// Append another set of coordinates, separated by a gap
    pub fn extend(&mut self, other: &FlatCoords) {
        if other.is_empty() {
            return;
        }
        if !self.is_empty() && !self.ends_with_gap() {
            self.push_gap();
        }
        self.x.extend_from_slice(&other.x);
        self.y.extend_from_slice(&other.y);
    }
}

/// Flatten one polygon.
///
/// The exterior ring comes first. When there are holes, a gap follows it
/// and every interior ring is followed by its own gap.
pub fn flatten_polygon(polygon: &Polygon<f64>) -> FlatCoords {
    let mut flat = FlatCoords::new();
    write_polygon(&mut flat, polygon);
    flat
}

/// Flatten a multipolygon: each part as a polygon, then a gap
pub fn flatten_multi_polygon(multi: &MultiPolygon<f64>) -> FlatCoords {
    let mut flat = FlatCoords::new();
    for polygon in multi {
        write_part(&mut flat, polygon);
    }
    flat
}

/// Flatten any polygonal geometry.
///
/// Geometry collections keep only their polygonal members. Anything
/// else fails with [`BandMapError::UnsupportedGeometry`] naming `record`.
pub fn flatten(record: &str, geometry: &Geometry<f64>) -> Result<FlatCoords> {
    match geometry {
        Geometry::Polygon(polygon) => Ok(flatten_polygon(polygon)),
        Geometry::MultiPolygon(multi) => Ok(flatten_multi_polygon(multi)),
        Geometry::Rect(rect) => Ok(flatten_polygon(&rect.to_polygon())),
        Geometry::Triangle(triangle) => Ok(flatten_polygon(&triangle.to_polygon())),
        Geometry::GeometryCollection(collection) => {
            let mut flat = FlatCoords::new();
            let mut parts = 0;
            collect_parts(&mut flat, collection.iter(), &mut parts);
            if parts == 0 {
                return Err(unsupported(record, geometry));
            }
            Ok(flat)
        }
        other => Err(unsupported(record, other)),
    }
}

/// Lazily flatten `(record, geometry)` pairs
pub fn flatten_all<'a, I>(features: I) -> impl Iterator<Item = Result<FlatCoords>> + 'a
where
    I: IntoIterator<Item = (&'a str, &'a Geometry<f64>)>,
    I::IntoIter: 'a,
{
    features
        .into_iter()
        .map(|(record, geometry)| flatten(record, geometry))
}

/// Name of a geometry variant, as GeoJSON spells it where it can
pub fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

fn unsupported(record: &str, geometry: &Geometry<f64>) -> BandMapError {
    BandMapError::UnsupportedGeometry {
        record: record.to_string(),
        geometry_type: geometry_type_name(geometry).to_string(),
    }
}

fn collect_parts<'a>(
    flat: &mut FlatCoords,
    members: impl Iterator<Item = &'a Geometry<f64>>,
    parts: &mut usize,
) {
    for member in members {
        match member {
            Geometry::Polygon(polygon) => {
                write_part(flat, polygon);
                *parts += 1;
            }
            Geometry::MultiPolygon(multi) => {
                for polygon in multi {
                    write_part(flat, polygon);
                    *parts += 1;
                }
            }
            Geometry::GeometryCollection(nested) => collect_parts(flat, nested.iter(), parts),
            _ => {}
        }
    }
}

fn write_polygon(flat: &mut FlatCoords, polygon: &Polygon<f64>) {
    flat.push_ring(polygon.exterior());
    if polygon.interiors().is_empty() {
        return;
    }
    flat.push_gap();
    for interior in polygon.interiors() {
        flat.push_ring(interior);
        flat.push_gap();
    }
}

// A polygon with holes already ends in a gap
fn write_part(flat: &mut FlatCoords, polygon: &Polygon<f64>) {
    write_polygon(flat, polygon);
    if !flat.ends_with_gap() {
        flat.push_gap();
    }
}
