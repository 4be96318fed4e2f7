//! Configuration management for bandmap.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::bands::BandSpec;
use crate::colormaps::get_colormap;
use crate::error::{BandMapError, Result};
use crate::schema::{JoinKey, RegionType};

/// Command-line arguments for bandmap
#[derive(Parser, Debug)]
#[command(name = "bandmap")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CSV of per-area values, one row per area
    pub values_file: PathBuf,

    /// GeoJSON FeatureCollection of area boundaries
    pub boundaries_file: PathBuf,

    /// Host address to bind to
    #[arg(short = 'H', long, env = "BANDMAP_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "BANDMAP_PORT")]
    pub port: Option<u16>,

    /// Path to JSON configuration file
    #[arg(short, long, env = "BANDMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "BANDMAP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Kind of area in the boundary file
    #[arg(short, long, env = "BANDMAP_REGION_TYPE", value_enum)]
    pub region_type: Option<RegionType>,

    /// Column of the values CSV holding the area identifier
    #[arg(long, env = "BANDMAP_ID_COLUMN")]
    pub id_column: Option<String>,

    /// Join values to boundaries by area name or code
    #[arg(long, env = "BANDMAP_JOIN_ON", value_enum)]
    pub join_on: Option<JoinKey>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Input data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the values CSV
    #[serde(default)]
    pub values_path: Option<PathBuf>,

    /// Path to the boundary GeoJSON
    #[serde(default)]
    pub boundaries_path: Option<PathBuf>,

    /// Kind of area in the boundary file
    #[serde(default = "default_region_type")]
    pub region_type: RegionType,

    /// Area identifier column in the values CSV
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Boundary property used for the join
    #[serde(default)]
    pub join_on: JoinKey,
}

/// Band settings used when a request leaves them out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSettings {
    pub v_min: f64,
    pub v_max: f64,
    pub step: f64,
    pub cmap: String,
}

impl BandSettings {
    /// Band specification for these settings
    pub fn to_spec(&self, diverging: bool) -> BandSpec {
        BandSpec::new(self.v_min, self.v_max, self.step).with_diverging(diverging)
    }
}

/// Default bands for plain and diverging maps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandDefaults {
    #[serde(default = "default_sequential_bands")]
    pub sequential: BandSettings,

    #[serde(default = "default_diverging_bands")]
    pub diverging: BandSettings,
}

impl BandDefaults {
    pub fn for_mode(&self, diverging: bool) -> &BandSettings {
        if diverging {
            &self.diverging
        } else {
            &self.sequential
        }
    }
}

/// Raster output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Default pixel size in metres
    #[serde(default = "default_pixel_size")]
    pub pixel_size: f64,

    /// Largest image (width * height) a request may ask for
    #[serde(default = "default_max_pixels")]
    pub max_pixels: usize,
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Data configuration
    #[serde(default)]
    pub data: DataConfig,

    /// Band defaults
    #[serde(default)]
    pub bands: BandDefaults,

    /// Raster configuration
    #[serde(default)]
    pub raster: RasterConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Build the configuration from parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        // Start with defaults
        let mut config = Config::default();

        // Load from JSON file if provided
        if let Some(config_path) = &args.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        // Override with command-line arguments and environment
        if let Some(host) = args.host {
            config.server.host = host;
        }
        if let Some(port) = args.port {
            config.server.port = port;
        }
        if let Some(log_level) = args.log_level {
            config.log_level = log_level;
        }
        if let Some(region_type) = args.region_type {
            config.data.region_type = region_type;
        }
        if let Some(id_column) = args.id_column {
            config.data.id_column = id_column;
        }
        if let Some(join_on) = args.join_on {
            config.data.join_on = join_on;
        }
        config.data.values_path = Some(args.values_file);
        config.data.boundaries_path = Some(args.boundaries_file);

        Ok(config)
    }

    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.server = other.server;
        if other.data.values_path.is_some() {
            self.data.values_path = other.data.values_path;
        }
        if other.data.boundaries_path.is_some() {
            self.data.boundaries_path = other.data.boundaries_path;
        }
        self.data.region_type = other.data.region_type;
        self.data.id_column = other.data.id_column;
        self.data.join_on = other.data.join_on;
        self.bands = other.bands;
        self.raster = other.raster;
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(BandMapError::Config {
                message: "Server host cannot be empty".to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(BandMapError::Config {
                message: "Server port cannot be 0".to_string(),
            });
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(BandMapError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        if self.data.id_column.trim().is_empty() {
            return Err(BandMapError::Config {
                message: "Id column cannot be empty".to_string(),
            });
        }

        for (mode, settings) in [
            ("sequential", &self.bands.sequential),
            ("diverging", &self.bands.diverging),
        ] {
            settings
                .to_spec(mode == "diverging")
                .validate()
                .map_err(|e| BandMapError::Config {
                    message: format!("Default {} bands: {}", mode, e),
                })?;
            get_colormap(&settings.cmap).map_err(|_| BandMapError::Config {
                message: format!("Default {} colormap is unknown: {}", mode, settings.cmap),
            })?;
        }

        if !(self.raster.pixel_size.is_finite() && self.raster.pixel_size > 0.0) {
            return Err(BandMapError::Config {
                message: format!(
                    "Raster pixel size must be positive, got {}",
                    self.raster.pixel_size
                ),
            });
        }
        if self.raster.max_pixels == 0 {
            return Err(BandMapError::Config {
                message: "Raster max_pixels cannot be 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            bands: BandDefaults::default(),
            raster: RasterConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            values_path: None,
            boundaries_path: None,
            region_type: default_region_type(),
            id_column: default_id_column(),
            join_on: JoinKey::default(),
        }
    }
}

impl Default for BandDefaults {
    fn default() -> Self {
        Self {
            sequential: default_sequential_bands(),
            diverging: default_diverging_bands(),
        }
    }
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            pixel_size: default_pixel_size(),
            max_pixels: default_max_pixels(),
        }
    }
}

// Default value functions for serde
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_region_type() -> RegionType {
    RegionType::Lsoa
}

fn default_id_column() -> String {
    "area_code".to_string()
}

fn default_sequential_bands() -> BandSettings {
    BandSettings {
        v_min: 0.0,
        v_max: 120.0,
        step: 30.0,
        cmap: "inferno".to_string(),
    }
}

fn default_diverging_bands() -> BandSettings {
    BandSettings {
        v_min: -120.0,
        v_max: 120.0,
        step: 30.0,
        cmap: "rd_bu".to_string(),
    }
}

fn default_pixel_size() -> f64 {
    1000.0
}

fn default_max_pixels() -> usize {
    4_000_000
}

fn default_log_level() -> String {
    "info".to_string()
}
