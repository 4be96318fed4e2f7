//! Coordinate reference systems and reprojection to British National Grid.
//!
//! Boundary files arrive either in WGS84 longitude/latitude (the GeoJSON
//! default) or already in British National Grid (EPSG:27700). Polygon union
//! needs planar metres, so geographic input is projected to the grid first:
//! WGS84 -> OSGB36 with a 7-parameter Helmert transform, then the National
//! Grid Transverse Mercator projection on the Airy 1830 ellipsoid.
//!
//! The Helmert step is accurate to a few metres, which is well inside the
//! generalisation of the boundary files this is used with.

use geo::{Coord, MapCoords, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::error::{BandMapError, Result};

/// EPSG codes known to be geographic (degrees rather than metres)
const GEOGRAPHIC_CODES: &[u32] = &[4326, 4258, 4277, 4269, 4230];

/// A coordinate reference system identified by EPSG code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "epsg", rename_all = "lowercase")]
pub enum Crs {
    /// Longitude/latitude in degrees
    Geographic(u32),
    /// Planar coordinates in metres
    Projected(u32),
}

impl Crs {
    /// WGS84 longitude/latitude, the GeoJSON default
    pub const WGS84: Crs = Crs::Geographic(4326);
    /// Ordnance Survey National Grid
    pub const BRITISH_NATIONAL_GRID: Crs = Crs::Projected(27700);

    /// Classify an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        if GEOGRAPHIC_CODES.contains(&code) {
            Crs::Geographic(code)
        } else {
            Crs::Projected(code)
        }
    }

    /// Parse the names used in GeoJSON `crs` members and config files:
    /// `EPSG:27700`, `urn:ogc:def:crs:EPSG::27700`, `urn:ogc:def:crs:OGC:1.3:CRS84`.
    pub fn parse(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        if trimmed.ends_with("CRS84") {
            return Ok(Crs::WGS84);
        }
        let code = trimmed
            .rsplit(':')
            .next()
            .and_then(|code| code.parse::<u32>().ok())
            .ok_or_else(|| BandMapError::Crs {
                message: format!("Unrecognised coordinate reference system: {}", name),
            })?;
        Ok(Crs::from_epsg(code))
    }

    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Geographic(code) | Crs::Projected(code) => *code,
        }
    }

    pub fn is_projected(&self) -> bool {
        matches!(self, Crs::Projected(_))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Reference ellipsoid
struct Ellipsoid {
    a: f64,
    b: f64,
}

impl Ellipsoid {
    fn e2(&self) -> f64 {
        1.0 - (self.b * self.b) / (self.a * self.a)
    }
}

const GRS80: Ellipsoid = Ellipsoid {
    a: 6_378_137.000,
    b: 6_356_752.314_140,
};

const AIRY_1830: Ellipsoid = Ellipsoid {
    a: 6_377_563.396,
    b: 6_356_256.909,
};

/// National Grid projection constants
const F0: f64 = 0.999_601_271_7;
const LAT0_DEG: f64 = 49.0;
const LON0_DEG: f64 = -2.0;
const E0: f64 = 400_000.0;
const N0: f64 = -100_000.0;

/// WGS84 -> OSGB36 Helmert parameters (metres, ppm, arc-seconds)
const TX: f64 = -446.448;
const TY: f64 = 125.157;
const TZ: f64 = -542.060;
const SCALE_PPM: f64 = 20.4894;
const RX_SEC: f64 = -0.1502;
const RY_SEC: f64 = -0.2470;
const RZ_SEC: f64 = -0.8421;

fn to_radians(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Convert a WGS84 longitude/latitude (degrees) to National Grid easting/northing
pub fn wgs84_to_bng(lon: f64, lat: f64) -> (f64, f64) {
    let (lat_osgb, lon_osgb) = helmert_wgs84_to_osgb36(to_radians(lat), to_radians(lon));
    osgb36_to_grid(lat_osgb, lon_osgb)
}

/// Datum shift on the ellipsoid surface, returning OSGB36 latitude/longitude in radians
fn helmert_wgs84_to_osgb36(lat: f64, lon: f64) -> (f64, f64) {
    // Geodetic to cartesian on GRS80 (height 0)
    let e2 = GRS80.e2();
    let nu = GRS80.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
    let x = nu * lat.cos() * lon.cos();
    let y = nu * lat.cos() * lon.sin();
    let z = nu * (1.0 - e2) * lat.sin();

    let s = SCALE_PPM * 1e-6;
    let sec = PI / (180.0 * 3600.0);
    let (rx, ry, rz) = (RX_SEC * sec, RY_SEC * sec, RZ_SEC * sec);

    let x2 = TX + (1.0 + s) * x - rz * y + ry * z;
    let y2 = TY + rz * x + (1.0 + s) * y - rx * z;
    let z2 = TZ - ry * x + rx * y + (1.0 + s) * z;

    // Cartesian back to geodetic on Airy 1830
    let e2 = AIRY_1830.e2();
    let p = (x2 * x2 + y2 * y2).sqrt();
    let mut lat = z2.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let nu = AIRY_1830.a / (1.0 - e2 * lat.sin().powi(2)).sqrt();
        let next = (z2 + e2 * nu * lat.sin()).atan2(p);
        if (next - lat).abs() < 1e-12 {
            lat = next;
            break;
        }
        lat = next;
    }
    let lon = y2.atan2(x2);
    (lat, lon)
}

/// Transverse Mercator projection of OSGB36 latitude/longitude (radians)
pub(crate) fn osgb36_to_grid(lat: f64, lon: f64) -> (f64, f64) {
    let Ellipsoid { a, b } = AIRY_1830;
    let e2 = AIRY_1830.e2();
    let lat0 = to_radians(LAT0_DEG);
    let lon0 = to_radians(LON0_DEG);
    let n = (a - b) / (a + b);
    let (n2, n3) = (n * n, n * n * n);

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();
    let tan2 = tan_lat * tan_lat;
    let tan4 = tan2 * tan2;

    let nu = a * F0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let rho = a * F0 * (1.0 - e2) * (1.0 - e2 * sin_lat * sin_lat).powf(-1.5);
    let eta2 = nu / rho - 1.0;

    let dlat = lat - lat0;
    let slat = lat + lat0;
    let m = b
        * F0
        * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * dlat
            - (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * dlat.sin() * slat.cos()
            + (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * dlat).sin() * (2.0 * slat).cos()
            - 35.0 / 24.0 * n3 * (3.0 * dlat).sin() * (3.0 * slat).cos());

    let i = m + N0;
    let ii = nu / 2.0 * sin_lat * cos_lat;
    let iii = nu / 24.0 * sin_lat * cos_lat.powi(3) * (5.0 - tan2 + 9.0 * eta2);
    let iiia = nu / 720.0 * sin_lat * cos_lat.powi(5) * (61.0 - 58.0 * tan2 + tan4);
    let iv = nu * cos_lat;
    let v = nu / 6.0 * cos_lat.powi(3) * (nu / rho - tan2);
    let vi = nu / 120.0
        * cos_lat.powi(5)
        * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta2 - 58.0 * tan2 * eta2);

    let dlon = lon - lon0;
    let northing = i + ii * dlon.powi(2) + iii * dlon.powi(4) + iiia * dlon.powi(6);
    let easting = E0 + iv * dlon + v * dlon.powi(3) + vi * dlon.powi(5);
    (easting, northing)
}

/// Project a geometry from `from` into British National Grid
pub fn reproject_to_bng(geometry: &MultiPolygon<f64>, from: Crs) -> Result<MultiPolygon<f64>> {
    match from {
        Crs::BRITISH_NATIONAL_GRID => Ok(geometry.clone()),
        Crs::WGS84 => Ok(geometry.map_coords(|c| {
            let (x, y) = wgs84_to_bng(c.x, c.y);
            Coord { x, y }
        })),
        other => Err(BandMapError::Crs {
            message: format!("No transformation from {} to {}", other, Crs::BRITISH_NATIONAL_GRID),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn dms(deg: f64, min: f64, sec: f64) -> f64 {
        deg + min / 60.0 + sec / 3600.0
    }

    #[test]
    fn test_parse_crs_names() {
        assert_eq!(Crs::parse("EPSG:27700").unwrap(), Crs::BRITISH_NATIONAL_GRID);
        assert_eq!(
            Crs::parse("urn:ogc:def:crs:EPSG::27700").unwrap(),
            Crs::BRITISH_NATIONAL_GRID
        );
        assert_eq!(Crs::parse("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(), Crs::WGS84);
        assert_eq!(Crs::parse("EPSG:4326").unwrap(), Crs::WGS84);
        assert!(Crs::parse("made up").is_err());
    }

    #[test]
    fn test_classification() {
        assert!(!Crs::WGS84.is_projected());
        assert!(Crs::BRITISH_NATIONAL_GRID.is_projected());
        assert!(!Crs::from_epsg(4258).is_projected());
        assert!(Crs::from_epsg(3857).is_projected());
        assert_eq!(Crs::BRITISH_NATIONAL_GRID.to_string(), "EPSG:27700");
    }

    #[test]
    fn test_transverse_mercator_worked_example() {
        // Ordnance Survey worked example: 52°39'27.2531"N 1°43'4.5177"E (OSGB36)
        let lat = to_radians(dms(52.0, 39.0, 27.2531));
        let lon = to_radians(dms(1.0, 43.0, 4.5177));
        let (e, n) = osgb36_to_grid(lat, lon);
        assert!((e - 651_409.903).abs() < 0.05, "easting {}", e);
        assert!((n - 313_177.270).abs() < 0.05, "northing {}", n);
    }

    #[test]
    fn test_wgs84_to_bng_lands_in_britain() {
        // Westminster
        let (e, n) = wgs84_to_bng(-0.1246, 51.5007);
        assert!((e - 530_270.0).abs() < 500.0, "easting {}", e);
        assert!((n - 179_640.0).abs() < 500.0, "northing {}", n);

        // Central meridian of the grid maps to the false easting
        let (e, _) = wgs84_to_bng(-2.0, 53.0);
        assert!((e - 400_000.0).abs() < 200.0, "easting {}", e);
    }

    #[test]
    fn test_reproject_geometry() {
        let square = MultiPolygon::new(vec![polygon![
            (x: -1.0, y: 52.0),
            (x: -0.99, y: 52.0),
            (x: -0.99, y: 52.01),
            (x: -1.0, y: 52.01),
            (x: -1.0, y: 52.0),
        ]]);
        let projected = reproject_to_bng(&square, Crs::WGS84).unwrap();
        let ring = &projected.0[0].exterior().0;
        assert_eq!(ring.len(), 5);
        // 0.01 degrees is roughly 690 m of longitude and 1.1 km of latitude here
        let width = ring[1].x - ring[0].x;
        let height = ring[2].y - ring[1].y;
        assert!(width > 600.0 && width < 800.0, "width {}", width);
        assert!(height > 1_000.0 && height < 1_200.0, "height {}", height);

        let unchanged = reproject_to_bng(&projected, Crs::BRITISH_NATIONAL_GRID).unwrap();
        assert_eq!(unchanged, projected);

        assert!(reproject_to_bng(&square, Crs::from_epsg(3857)).is_err());
    }
}
