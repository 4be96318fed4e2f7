//! From a value series to coloured, dissolved, flattened map layers.
//!
//! band -> join with boundaries -> dissolve per band -> colour -> flatten.

use geo::MultiPolygon;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, warn};

use crate::bands::{assign_bands, BandSpec, Bands};
use crate::colormaps::{colour_scale, make_colour_map, Colour, ColourMap, ColourScale};
use crate::data_loader::BoundaryLayer;
use crate::error::Result;
use crate::geometry::dissolve::{dissolve_by_label, BandKey, LabelledGeometry};
use crate::geometry::flatten::{flatten_multi_polygon, FlatCoords};
use crate::logging::{log_operation_end, log_operation_start};
use crate::schema::JoinKey;

/// All areas of one band, merged and ready to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColourLayer {
    /// Band label, e.g. `30.000 <= v < 60.000`
    pub label: String,
    /// Band index, also the colour's position in the colour map
    pub band: usize,
    /// Fill colour of the band
    pub colour: Colour,
    /// Number of areas merged into this layer
    pub area_count: usize,
    /// Flattened outline, serialized as top-level `x` and `y`
    #[serde(flatten)]
    pub coords: FlatCoords,
    /// Dissolved outline, kept for rasterizing
    #[serde(skip)]
    pub geometry: MultiPolygon<f64>,
}

/// Layers for one map plus the legend that goes with them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColourLayers {
    /// Boundaries and labels the values were cut with
    pub bands: Bands,
    /// One colour per label, including bands with no areas
    pub colours: ColourMap,
    /// Stepped colour bar for the legend
    pub scale: ColourScale,
    /// One layer per band that has at least one area, in band order
    pub layers: Vec<ColourLayer>,
    /// Values with no matching boundary
    pub unmatched: usize,
    /// Areas whose geometry could not be repaired
    pub dropped: Vec<String>,
    /// NaN values left out
    pub excluded: usize,
}

/// Build the coloured layers for a value series.
///
/// Values are joined to `boundaries` on `join_on`; a value with no
/// matching area is skipped and counted. The first value wins when an id
/// repeats.
pub fn create_colour_layers<'a, I>(
    values: I,
    boundaries: &BoundaryLayer,
    join_on: JoinKey,
    spec: &BandSpec,
    cmap_name: &str,
) -> Result<ColourLayers>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let start = Instant::now();
    log_operation_start("create_colour_layers", Some(cmap_name));

    let assignment = assign_bands(values, spec)?;
    let colours = make_colour_map(&assignment.bands.labels, cmap_name)?;
    let scale = colour_scale(&assignment.bands, spec, &colours);

    let index = boundaries.index_by(join_on);
    let mut joined = std::collections::HashSet::new();
    let mut records = Vec::with_capacity(assignment.rows.len());
    let mut unmatched = 0;

    for row in &assignment.rows {
        let Some(&area_index) = index.get(row.area_id.as_str()) else {
            unmatched += 1;
            continue;
        };
        if !joined.insert(area_index) {
            continue;
        }
        records.push(LabelledGeometry {
            area_id: row.area_id.clone(),
            geometry: boundaries.areas[area_index].geometry.clone(),
            crs: boundaries.crs,
            band: Some(BandKey {
                index: row.band,
                label: assignment.label_of(row).to_string(),
            }),
        });
    }
    if unmatched > 0 {
        warn!(unmatched, "Values without a matching boundary were skipped");
    }

    let dissolved = dissolve_by_label(&records)?;
    debug!(
        records = records.len(),
        regions = dissolved.regions.len(),
        dropped = dissolved.dropped.len(),
        "Dissolved areas by band"
    );

    let layers = dissolved
        .regions
        .into_iter()
        .map(|region| {
            let colour = colours
                .colour_at(region.band.index)
                .unwrap_or(Colour::TRANSPARENT);
            ColourLayer {
                coords: flatten_multi_polygon(&region.geometry),
                label: region.band.label,
                band: region.band.index,
                colour,
                area_count: region.members.len(),
                geometry: region.geometry,
            }
        })
        .collect();

    log_operation_end("create_colour_layers", start, dissolved.dropped.is_empty());

    Ok(ColourLayers {
        bands: assignment.bands,
        colours,
        scale,
        layers,
        unmatched,
        dropped: dissolved.dropped,
        excluded: assignment.excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::AreaGeometry;
    use crate::geometry::crs::Crs;
    use crate::schema::{PropertyNames, RegionType};
    use geo::{polygon, Area};

    fn square(x: f64, y: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: y),
            (x: x + 1000.0, y: y),
            (x: x + 1000.0, y: y + 1000.0),
            (x: x, y: y + 1000.0),
            (x: x, y: y),
        ]])
    }

    fn boundaries() -> BoundaryLayer {
        let areas = (0..4)
            .map(|i| AreaGeometry {
                code: format!("E0100000{}", i),
                name: format!("Area 00{}", i),
                geometry: square(i as f64 * 1000.0, 0.0),
            })
            .collect();
        BoundaryLayer {
            region_type: RegionType::Lsoa,
            properties: PropertyNames {
                name: "LSOA11NM".to_string(),
                code: "LSOA11CD".to_string(),
            },
            crs: Crs::BRITISH_NATIONAL_GRID,
            areas,
            skipped: 0,
        }
    }

    #[test]
    fn test_layers_per_present_band() {
        let values = [
            ("E01000000", 10.0),
            ("E01000001", 20.0),
            ("E01000002", 45.0),
            ("E01000003", f64::NAN),
            ("E09999999", 5.0),
        ];
        let spec = BandSpec::new(0.0, 120.0, 30.0);
        let result =
            create_colour_layers(values, &boundaries(), JoinKey::Code, &spec, "inferno").unwrap();

        assert_eq!(result.excluded, 1);
        assert_eq!(result.unmatched, 1);
        assert!(result.dropped.is_empty());
        assert_eq!(result.layers.len(), 2);

        let first = &result.layers[0];
        assert_eq!(first.label, "0.000 <= v < 30.000");
        assert_eq!(first.area_count, 2);
        assert!((first.geometry.unsigned_area() - 2.0e6).abs() < 1e-3);
        assert_eq!(first.coords.split_rings().len(), 1);
        assert_eq!(Some(first.colour), result.colours.colour_at(first.band));

        assert_eq!(result.layers[1].label, "30.000 <= v < 60.000");
        assert_eq!(result.colours.len(), result.bands.len());
    }

    #[test]
    fn test_join_on_name() {
        let values = [("Area 000", 1.0), ("E01000001", 1.0)];
        let spec = BandSpec::new(0.0, 120.0, 30.0);
        let result =
            create_colour_layers(values, &boundaries(), JoinKey::Name, &spec, "viridis").unwrap();
        assert_eq!(result.layers.len(), 1);
        assert_eq!(result.layers[0].area_count, 1);
        assert_eq!(result.unmatched, 1);
    }

    #[test]
    fn test_repeated_ids_join_once() {
        let values = [("E01000000", 1.0), ("E01000000", 100.0)];
        let spec = BandSpec::new(0.0, 120.0, 30.0);
        let result =
            create_colour_layers(values, &boundaries(), JoinKey::Code, &spec, "viridis").unwrap();
        assert_eq!(result.layers.len(), 1);
        assert_eq!(result.layers[0].label, "0.000 <= v < 30.000");
    }

    #[test]
    fn test_diverging_layers() {
        let values = [("E01000000", -5.0), ("E01000001", 0.0), ("E01000002", 5.0)];
        let spec = BandSpec::new(-120.0, 120.0, 30.0).with_diverging(true);
        let result =
            create_colour_layers(values, &boundaries(), JoinKey::Code, &spec, "rd_bu").unwrap();
        let labels: Vec<&str> = result.layers.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[1], "0.0");
        assert_eq!(Some(result.layers[1].band), result.bands.zero_band);
    }

    #[test]
    fn test_invalid_spec_fails_before_processing() {
        let spec = BandSpec::new(10.0, 0.0, 5.0);
        let result = create_colour_layers(
            [("E01000000", 1.0)],
            &boundaries(),
            JoinKey::Code,
            &spec,
            "viridis",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_layers_serialize_flat_coordinates() {
        let spec = BandSpec::new(0.0, 120.0, 30.0);
        let result = create_colour_layers(
            [("E01000000", 1.0)],
            &boundaries(),
            JoinKey::Code,
            &spec,
            "viridis",
        )
        .unwrap();
        let json = serde_json::to_value(&result.layers[0]).unwrap();
        assert!(json["x"].is_array());
        assert!(json["y"].is_array());
        assert!(json.get("geometry").is_none());
        assert_eq!(json["label"], "0.000 <= v < 30.000");
    }
}
