//! Loading per-area values and area boundaries.
//!
//! Values come from a CSV with one row per area and one numeric column per
//! measure. Boundaries come from a GeoJSON FeatureCollection whose feature
//! properties follow the [`RegionType`] schema. Both are read once at
//! startup and held in memory.

use csv::{ReaderBuilder, Trim};
use geo::{BoundingRect, MultiPolygon, Rect};
use geojson::GeoJson;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{BandMapError, Result};
use crate::geometry::crs::{reproject_to_bng, Crs};
use crate::logging::{log_data_load_stats, log_timed_operation};
use crate::schema::{JoinKey, PropertyNames, RegionType};
use crate::state::AppState;

/// Per-area numeric columns keyed by area identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValueTable {
    /// Name of the identifier column
    pub id_column: String,
    /// Area identifiers, in file order
    pub ids: Vec<String>,
    /// Numeric columns; unparseable cells are NaN
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl ValueTable {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Values of one column
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| BandMapError::DataNotFound {
                message: format!("Column '{}' not found", name),
            })
    }

    /// `(area id, value)` pairs of one column
    pub fn series(&self, name: &str) -> Result<Vec<(&str, f64)>> {
        let column = self.column(name)?;
        Ok(self
            .ids
            .iter()
            .map(String::as_str)
            .zip(column.iter().copied())
            .collect())
    }

    /// Add or replace a derived column
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if values.len() != self.ids.len() {
            return Err(BandMapError::InvalidParameter {
                param: name,
                message: format!(
                    "column has {} values but the table has {} rows",
                    values.len(),
                    self.ids.len()
                ),
            });
        }
        self.columns.insert(name, values);
        Ok(self)
    }
}

/// Read a values CSV from disk
pub fn load_value_table(path: &Path, id_column: &str) -> Result<ValueTable> {
    let file = File::open(path).map_err(|e| {
        BandMapError::Io(std::io::Error::new(
            e.kind(),
            format!("Cannot open values file {}: {}", path.display(), e),
        ))
    })?;
    read_value_table(BufReader::new(file), id_column)
}

/// Read a values CSV from any reader
pub fn read_value_table<R: Read>(reader: R, id_column: &str) -> Result<ValueTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let id_index = headers
        .iter()
        .position(|h| h == id_column)
        .ok_or_else(|| BandMapError::Schema {
            message: format!(
                "Values file has no '{}' column; found [{}]",
                id_column,
                headers.iter().collect::<Vec<_>>().join(", ")
            ),
        })?;

    let value_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != id_index)
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut ids = Vec::new();
    let mut columns: BTreeMap<String, Vec<f64>> = value_columns
        .iter()
        .map(|(_, name)| (name.clone(), Vec::new()))
        .collect();

    for record in reader.records() {
        let record = record?;
        let id = record.get(id_index).unwrap_or_default().to_string();
        if id.is_empty() {
            warn!(line = ?record.position().map(|p| p.line()), "Skipping row without an area id");
            continue;
        }
        ids.push(id);
        for (index, name) in &value_columns {
            let value = record
                .get(*index)
                .and_then(|cell| cell.parse::<f64>().ok())
                .unwrap_or(f64::NAN);
            if let Some(column) = columns.get_mut(name) {
                column.push(value);
            }
        }
    }

    let mut seen = HashMap::with_capacity(ids.len());
    for id in &ids {
        *seen.entry(id.as_str()).or_insert(0usize) += 1;
    }
    let duplicates = seen.values().filter(|count| **count > 1).count();
    if duplicates > 0 {
        warn!(duplicates, "Values file repeats some area ids; the first row wins in joins");
    }

    debug!(rows = ids.len(), columns = columns.len(), "Read values table");

    Ok(ValueTable {
        id_column: id_column.to_string(),
        ids,
        columns,
    })
}

/// One area outline with its identifiers
#[derive(Debug, Clone, PartialEq)]
pub struct AreaGeometry {
    pub code: String,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl AreaGeometry {
    /// Identifier used when joining values
    pub fn key(&self, join_on: JoinKey) -> &str {
        match join_on {
            JoinKey::Name => &self.name,
            JoinKey::Code => &self.code,
        }
    }
}

/// All areas of one boundary file
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLayer {
    pub region_type: RegionType,
    pub properties: PropertyNames,
    pub crs: Crs,
    pub areas: Vec<AreaGeometry>,
    /// Features left out because they had no polygonal geometry
    pub skipped: usize,
}

impl BoundaryLayer {
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Index of each area by join key; the first area wins on duplicates
    pub fn index_by(&self, join_on: JoinKey) -> HashMap<&str, usize> {
        let mut index = HashMap::with_capacity(self.areas.len());
        for (i, area) in self.areas.iter().enumerate() {
            index.entry(area.key(join_on)).or_insert(i);
        }
        index
    }

    /// Bounding box of every area
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.areas
            .iter()
            .filter_map(|area| area.geometry.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                    (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                )
            })
    }

    /// Reproject every area to British National Grid
    pub fn to_bng(self) -> Result<Self> {
        if self.crs == Crs::BRITISH_NATIONAL_GRID {
            return Ok(self);
        }
        let from = self.crs;
        let areas = self
            .areas
            .into_iter()
            .map(|area| {
                Ok(AreaGeometry {
                    geometry: reproject_to_bng(&area.geometry, from)?,
                    ..area
                })
            })
            .collect::<Result<Vec<_>>>()?;
        info!(from = %from, areas = areas.len(), "Reprojected boundaries to EPSG:27700");
        Ok(Self {
            crs: Crs::BRITISH_NATIONAL_GRID,
            areas,
            ..self
        })
    }
}

/// Read a boundary GeoJSON file from disk
pub fn load_boundaries(path: &Path, region_type: RegionType) -> Result<BoundaryLayer> {
    let file = File::open(path).map_err(|e| {
        BandMapError::Io(std::io::Error::new(
            e.kind(),
            format!("Cannot open boundary file {}: {}", path.display(), e),
        ))
    })?;
    read_boundaries(BufReader::new(file), region_type)
}

/// Read boundary GeoJSON from any reader
pub fn read_boundaries<R: Read>(reader: R, region_type: RegionType) -> Result<BoundaryLayer> {
    let collection = match GeoJson::from_reader(reader)? {
        GeoJson::FeatureCollection(collection) => collection,
        _ => {
            return Err(BandMapError::Schema {
                message: "Boundary file must be a GeoJSON FeatureCollection".to_string(),
            })
        }
    };

    let crs = match collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.pointer("/properties/name"))
        .and_then(|name| name.as_str())
    {
        Some(name) => Crs::parse(name)?,
        None => Crs::WGS84,
    };

    let first_keys: Vec<&str> = collection
        .features
        .first()
        .and_then(|feature| feature.properties.as_ref())
        .map(|props| props.keys().map(String::as_str).collect())
        .unwrap_or_default();
    let properties = region_type.resolve_properties(first_keys)?;

    let mut areas = Vec::with_capacity(collection.features.len());
    let mut skipped = 0;

    for (index, feature) in collection.features.into_iter().enumerate() {
        let props = feature.properties.as_ref();
        let code = property_string(props, &properties.code);
        let name = property_string(props, &properties.name);
        let (Some(code), Some(name)) = (code, name) else {
            return Err(BandMapError::Schema {
                message: format!(
                    "Feature {} is missing {} or {}",
                    index, properties.code, properties.name
                ),
            });
        };

        let Some(geometry) = feature.geometry else {
            warn!(area = %code, "Skipping feature without geometry");
            skipped += 1;
            continue;
        };
        let geometry: geo::Geometry<f64> = geometry.value.try_into()?;
        let geometry = match geometry {
            geo::Geometry::MultiPolygon(multi) => multi,
            geo::Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
            other => {
                warn!(
                    area = %code,
                    geometry_type = crate::geometry::geometry_type_name(&other),
                    "Skipping feature without polygonal geometry"
                );
                skipped += 1;
                continue;
            }
        };

        areas.push(AreaGeometry {
            code,
            name,
            geometry,
        });
    }

    debug!(areas = areas.len(), skipped, crs = %crs, "Read boundaries");

    Ok(BoundaryLayer {
        region_type,
        properties,
        crs,
        areas,
        skipped,
    })
}

fn property_string(
    props: Option<&serde_json::Map<String, serde_json::Value>>,
    key: &str,
) -> Option<String> {
    match props?.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Load both input files and build the application state
pub fn load_data(config: Config) -> Result<AppState> {
    let start = Instant::now();
    let values_path = config
        .data
        .values_path
        .clone()
        .ok_or_else(|| BandMapError::Config {
            message: "No values file configured".to_string(),
        })?;
    let boundaries_path = config
        .data
        .boundaries_path
        .clone()
        .ok_or_else(|| BandMapError::Config {
            message: "No boundary file configured".to_string(),
        })?;

    let values = log_timed_operation("load_value_table", || {
        load_value_table(&values_path, &config.data.id_column)
    })?;
    let boundaries = log_timed_operation("load_boundaries", || {
        load_boundaries(&boundaries_path, config.data.region_type)
    })?;
    let source_crs = boundaries.crs;
    let boundaries = log_timed_operation("reproject_boundaries", || boundaries.to_bng())?;

    validate_join(&values, &boundaries, config.data.join_on)?;

    log_data_load_stats(
        &values_path.display().to_string(),
        values.len(),
        &values.column_names(),
        &boundaries_path.display().to_string(),
        boundaries.len(),
        &source_crs.to_string(),
    );
    debug!(
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Input files loaded"
    );

    Ok(AppState::new(config, values, boundaries))
}

/// Fail early when values and boundaries share no areas at all
fn validate_join(values: &ValueTable, boundaries: &BoundaryLayer, join_on: JoinKey) -> Result<()> {
    if values.is_empty() || boundaries.is_empty() {
        return Err(BandMapError::DataNotFound {
            message: format!(
                "Nothing to map: {} value rows, {} areas",
                values.len(),
                boundaries.len()
            ),
        });
    }

    let index = boundaries.index_by(join_on);
    let matched = values
        .ids
        .iter()
        .filter(|id| index.contains_key(id.as_str()))
        .count();
    if matched == 0 {
        return Err(BandMapError::Schema {
            message: format!(
                "No value row matches an area {:?}; check the id column and join key",
                join_on
            ),
        });
    }
    if matched < values.len() {
        warn!(
            matched,
            unmatched = values.len() - matched,
            "Some value rows have no boundary"
        );
    }
    Ok(())
}
