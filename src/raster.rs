//! Burn dissolved band layers into a pixel grid and encode it as PNG.
//!
//! The grid origin is the north-west corner of the layers' total bounds,
//! so row 0 is the northernmost row. Every pixel a layer touches takes that
//! layer's band, so areas smaller than a pixel still show up. Pixels outside
//! every layer stay empty and are drawn transparent.

use geo::{BoundingRect, Intersects, MultiPolygon, Rect};
use image::{ImageBuffer, Rgba, RgbaImage};
use ndarray::Array2;
use serde::Serialize;
use std::io::Cursor;
use tracing::debug;

use crate::colormaps::ColourMap;
use crate::error::{BandMapError, Result};
use crate::pipeline::ColourLayer;

/// Fraction of a pixel trimmed from each side of its extent before testing
/// for contact
const CELL_INSET: f64 = 1e-9;

/// Placement and size of a raster grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridSpec {
    /// West edge of column 0
    pub x_min: f64,
    /// North edge of row 0
    pub y_max: f64,
    /// Side of a square pixel, in CRS units
    pub pixel_size: f64,
    /// Columns
    pub width: usize,
    /// Rows
    pub height: usize,
}

impl GridSpec {
    /// Grid covering `bounds` with square pixels.
    ///
    /// Each side gets `floor((pixel_size + extent) / pixel_size)` pixels,
    /// which always leaves room for the far edge.
    pub fn covering(bounds: Rect<f64>, pixel_size: f64) -> Result<Self> {
        if !(pixel_size.is_finite() && pixel_size > 0.0) {
            return Err(BandMapError::InvalidParameter {
                param: "pixel_size".to_string(),
                message: format!("must be a positive number, got {}", pixel_size),
            });
        }
        let cells = |extent: f64| ((pixel_size + extent) / pixel_size).floor() as usize;
        Ok(Self {
            x_min: bounds.min().x,
            y_max: bounds.max().y,
            pixel_size,
            width: cells(bounds.width()),
            height: cells(bounds.height()),
        })
    }

    /// Total pixels, saturating on overflow
    pub fn pixel_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// Map coordinates of a pixel centre
    pub fn cell_centre(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.x_min + (col as f64 + 0.5) * self.pixel_size,
            self.y_max - (row as f64 + 0.5) * self.pixel_size,
        )
    }

    /// Extent of a pixel, shrunk by a hair so a shape that only shares an
    /// edge with the pixel does not count as touching it
    pub fn cell_rect(&self, row: usize, col: usize) -> Rect<f64> {
        let inset = self.pixel_size * CELL_INSET;
        let x0 = self.x_min + col as f64 * self.pixel_size;
        let y1 = self.y_max - row as f64 * self.pixel_size;
        Rect::new(
            (x0 + inset, y1 - self.pixel_size + inset),
            (x0 + self.pixel_size - inset, y1 - inset),
        )
    }

    /// Row/column ranges of the pixels `rect` overlaps
    fn cells_within(&self, rect: Rect<f64>) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let clamp = |v: f64, max: usize| (v.max(0.0) as usize).min(max);
        let col_lo = clamp(((rect.min().x - self.x_min) / self.pixel_size).floor(), self.width);
        let col_hi = clamp(((rect.max().x - self.x_min) / self.pixel_size).ceil(), self.width);
        let row_lo = clamp(((self.y_max - rect.max().y) / self.pixel_size).floor(), self.height);
        let row_hi = clamp(((self.y_max - rect.min().y) / self.pixel_size).ceil(), self.height);
        (row_lo..row_hi, col_lo..col_hi)
    }
}

/// Band index per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    pub spec: GridSpec,
    /// `cells[[row, col]]`, row 0 north
    pub cells: Array2<Option<usize>>,
}

impl RasterGrid {
    pub fn width(&self) -> usize {
        self.spec.width
    }

    pub fn height(&self) -> usize {
        self.spec.height
    }

    /// Number of pixels that took each band
    pub fn band_counts(&self) -> std::collections::BTreeMap<usize, usize> {
        let mut counts = std::collections::BTreeMap::new();
        for band in self.cells.iter().flatten() {
            *counts.entry(*band).or_insert(0) += 1;
        }
        counts
    }
}

/// Total bounds of a set of shapes
pub fn total_bounds<'a, I>(shapes: I) -> Option<Rect<f64>>
where
    I: IntoIterator<Item = &'a MultiPolygon<f64>>,
{
    shapes
        .into_iter()
        .filter_map(|shape| shape.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
            )
        })
}

/// Burn `(band, shape)` pairs into a grid.
///
/// A pixel is burned when its extent intersects the shape, not only when
/// the shape covers its centre. Later shapes win where they overlap.
pub fn rasterize<'a, I>(shapes: I, spec: GridSpec) -> RasterGrid
where
    I: IntoIterator<Item = (usize, &'a MultiPolygon<f64>)>,
{
    let mut cells = Array2::from_elem((spec.height, spec.width), None);

    for (band, shape) in shapes {
        let Some(rect) = shape.bounding_rect() else {
            continue;
        };
        let (rows, cols) = spec.cells_within(rect);
        for row in rows {
            for col in cols.clone() {
                if shape.intersects(&spec.cell_rect(row, col)) {
                    cells[[row, col]] = Some(band);
                }
            }
        }
    }

    RasterGrid { spec, cells }
}

/// Rasterize colour layers over their own total bounds
pub fn rasterize_layers(layers: &[ColourLayer], pixel_size: f64) -> Result<RasterGrid> {
    let bounds = total_bounds(layers.iter().map(|layer| &layer.geometry)).ok_or_else(|| {
        BandMapError::DataNotFound {
            message: "No geometry to rasterize".to_string(),
        }
    })?;
    let spec = GridSpec::covering(bounds, pixel_size)?;
    debug!(width = spec.width, height = spec.height, pixel_size, "Rasterizing layers");
    Ok(rasterize(
        layers.iter().map(|layer| (layer.band, &layer.geometry)),
        spec,
    ))
}

/// Colour a grid and encode it as PNG; empty pixels are transparent
pub fn render_png(grid: &RasterGrid, colours: &ColourMap) -> Result<Vec<u8>> {
    let width = u32::try_from(grid.width()).map_err(|_| too_large(grid))?;
    let height = u32::try_from(grid.height()).map_err(|_| too_large(grid))?;

    let img: RgbaImage = ImageBuffer::from_fn(width, height, |x, y| {
        let rgba = grid.cells[[y as usize, x as usize]]
            .and_then(|band| colours.colour_at(band))
            .map(|colour| colour.to_rgba8())
            .unwrap_or([0, 0, 0, 0]);
        Rgba(rgba)
    });

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)
        .map_err(|e| BandMapError::ImageGeneration {
            message: format!("Failed to encode PNG: {}", e),
        })?;
    Ok(buffer.into_inner())
}

fn too_large(grid: &RasterGrid) -> BandMapError {
    BandMapError::ImageGeneration {
        message: format!("Raster of {}x{} is too large", grid.width(), grid.height()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormaps::make_colour_map;
    use geo::polygon;

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
            (x: x, y: y),
        ]])
    }

    #[test]
    fn test_grid_size_follows_floor_rule() {
        let bounds = Rect::new((0.0, 0.0), (4000.0, 2500.0));
        let spec = GridSpec::covering(bounds, 1000.0).unwrap();
        assert_eq!(spec.width, 5);
        assert_eq!(spec.height, 3);
        assert_eq!(spec.cell_centre(0, 0), (500.0, 2000.0));
        assert!(GridSpec::covering(bounds, 0.0).is_err());
    }

    #[test]
    fn test_north_is_row_zero() {
        let south = square(0.0, 0.0, 2000.0);
        let north = square(0.0, 2000.0, 2000.0);
        let bounds = total_bounds([&south, &north]).unwrap();
        let spec = GridSpec::covering(bounds, 1000.0).unwrap();
        let grid = rasterize([(0, &south), (1, &north)], spec);

        assert_eq!(grid.height(), 5);
        assert_eq!(grid.cells[[0, 0]], Some(1));
        assert_eq!(grid.cells[[3, 0]], Some(0));
        // the extra column past the eastern edge stays empty
        assert_eq!(grid.cells[[0, 2]], None);

        let counts = grid.band_counts();
        assert_eq!(counts.get(&0), Some(&4));
        assert_eq!(counts.get(&1), Some(&4));
    }

    #[test]
    fn test_render_png() {
        let shape = square(0.0, 0.0, 3000.0);
        let spec = GridSpec::covering(shape.bounding_rect().unwrap(), 1000.0).unwrap();
        let grid = rasterize([(1, &shape)], spec);
        let labels = vec!["a".to_string(), "b".to_string()];
        let colours = make_colour_map(&labels, "viridis").unwrap();

        let png = render_png(&grid, &colours).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 4));

        // row 3 is the padding row south of the square
        let inside = decoded.get_pixel(0, 0);
        assert_eq!(inside.0, colours.colour_at(1).unwrap().to_rgba8());
        let outside = decoded.get_pixel(3, 0);
        assert_eq!(outside.0[3], 0);
        assert_eq!(decoded.get_pixel(0, 3).0[3], 0);
    }

    #[test]
    fn test_sub_pixel_area_is_burned() {
        let large = square(0.0, 0.0, 5000.0);
        let small = square(1200.0, 1200.0, 300.0);
        let spec = GridSpec::covering(large.bounding_rect().unwrap(), 1000.0).unwrap();
        let grid = rasterize([(0, &large), (1, &small)], spec);

        let counts = grid.band_counts();
        assert_eq!(counts.get(&0), Some(&24));
        assert_eq!(counts.get(&1), Some(&1));
        // y 1000..2000 is row 3 counting down from y_max = 5000
        assert_eq!(grid.cells[[3, 1]], Some(1));
    }

    #[test]
    fn test_sub_pixel_area_alone_is_burned() {
        let tiny = square(200.0, 200.0, 100.0);
        let spec = GridSpec::covering(tiny.bounding_rect().unwrap(), 1000.0).unwrap();
        assert_eq!((spec.width, spec.height), (1, 1));
        let grid = rasterize([(2, &tiny)], spec);
        assert_eq!(grid.cells[[0, 0]], Some(2));
    }

    #[test]
    fn test_shared_edge_does_not_touch() {
        let west = square(0.0, 0.0, 1000.0);
        let east = square(1000.0, 0.0, 1000.0);
        let bounds = total_bounds([&west, &east]).unwrap();
        let spec = GridSpec::covering(bounds, 1000.0).unwrap();
        let grid = rasterize([(0, &west), (1, &east)], spec);
        assert_eq!(grid.cells[[0, 0]], Some(0));
        assert_eq!(grid.cells[[0, 1]], Some(1));
        assert_eq!(grid.cells[[0, 2]], None);
    }
}
