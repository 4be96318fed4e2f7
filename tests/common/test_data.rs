//! Test data generation utilities.
//!
//! Writes small boundary GeoJSON and value CSV files with a known layout:
//! a grid of 1 km squares on the British National Grid, one LSOA per
//! square, coded `E01000001` onwards row by row from the south-west.

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Side of one grid square in metres
pub const CELL_SIZE: f64 = 1000.0;

/// South-west corner of the grid
pub const ORIGIN: (f64, f64) = (400_000.0, 300_000.0);

/// Area code of the square at `(col, row)` in a grid `cols` wide
pub fn area_code(col: usize, row: usize, cols: usize) -> String {
    format!("E0100{:04}", row * cols + col + 1)
}

/// Closed ring of the square at `(col, row)`
pub fn square_ring(col: usize, row: usize) -> Vec<[f64; 2]> {
    let x = ORIGIN.0 + col as f64 * CELL_SIZE;
    let y = ORIGIN.1 + row as f64 * CELL_SIZE;
    vec![
        [x, y],
        [x + CELL_SIZE, y],
        [x + CELL_SIZE, y + CELL_SIZE],
        [x, y + CELL_SIZE],
        [x, y],
    ]
}

/// FeatureCollection of a `cols` x `rows` grid of LSOA squares in EPSG:27700
pub fn lsoa_grid_geojson(cols: usize, rows: usize) -> Value {
    let mut features = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            features.push(json!({
                "type": "Feature",
                "properties": {
                    "LSOA11CD": area_code(col, row, cols),
                    "LSOA11NM": format!("Testshire {:03}", row * cols + col + 1),
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [square_ring(col, row)],
                },
            }));
        }
    }

    json!({
        "type": "FeatureCollection",
        "crs": {
            "type": "name",
            "properties": { "name": "urn:ogc:def:crs:EPSG::27700" },
        },
        "features": features,
    })
}

/// One CSV row per square with a `value` column and two travel-time units.
///
/// `value` is the 1-based area number times 10, so a 3 x 2 grid holds
/// 10..=60. `LE15WW` grows from west to east, `TA15DA` from east to west.
pub fn grid_values_csv(cols: usize, rows: usize) -> String {
    let mut csv = String::from("area_code,value,LE15WW,TA15DA\n");
    for row in 0..rows {
        for col in 0..cols {
            let number = row * cols + col + 1;
            csv.push_str(&format!(
                "{},{},{},{}\n",
                area_code(col, row, cols),
                number as f64 * 10.0,
                10.0 + col as f64 * 20.0,
                10.0 + (cols - 1 - col) as f64 * 20.0,
            ));
        }
    }
    csv
}

/// Input files written into a temporary directory
pub struct TestDataset {
    /// Keeps the files alive for the lifetime of the dataset
    pub dir: TempDir,
    pub values_path: PathBuf,
    pub boundaries_path: PathBuf,
}

/// Write the grid files into a fresh temporary directory
pub fn write_grid_dataset(cols: usize, rows: usize) -> std::io::Result<TestDataset> {
    let dir = tempfile::tempdir()?;
    let values_path = dir.path().join("values.csv");
    let boundaries_path = dir.path().join("LSOA.geojson");

    fs::write(&values_path, grid_values_csv(cols, rows))?;
    write_json(&boundaries_path, &lsoa_grid_geojson(cols, rows))?;

    Ok(TestDataset {
        dir,
        values_path,
        boundaries_path,
    })
}

/// Write a JSON value to disk
pub fn write_json(path: &Path, value: &Value) -> std::io::Result<()> {
    fs::write(path, serde_json::to_vec_pretty(value)?)
}
