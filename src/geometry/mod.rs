//! Geometry handling: reprojection, dissolve and flattening.

pub mod crs;
pub mod dissolve;
pub mod flatten;

pub use crs::{reproject_to_bng, wgs84_to_bng, Crs};
pub use dissolve::{
    dissolve_by_label, repair, union_all, BandKey, DissolveOutput, DissolvedRegion,
    LabelledGeometry,
};
pub use flatten::{flatten, flatten_all, geometry_type_name, FlatCoords};
