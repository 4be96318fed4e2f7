//! Error types for the bandmap library.
//!
//! A single enum covers every failure the loaders, the banding pipeline and
//! the HTTP layer can report.

use axum::http::StatusCode;
use thiserror::Error;

/// The main error type for bandmap operations.
#[derive(Error, Debug)]
pub enum BandMapError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// GeoJSON parsing or conversion errors
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors, including invalid band settings
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Data not found errors
    #[error("Data not found: {message}")]
    DataNotFound { message: String },

    /// Input file does not match the declared region schema
    #[error("Schema error: {message}")]
    Schema { message: String },

    /// A geometry the flattener cannot turn into rings
    #[error("Unsupported geometry type {geometry_type} in record {record}")]
    UnsupportedGeometry {
        record: String,
        geometry_type: String,
    },

    /// Coordinate reference system errors
    #[error("Coordinate reference system error: {message}")]
    Crs { message: String },

    /// Image generation errors
    #[error("Image generation error: {message}")]
    ImageGeneration { message: String },

    /// Server errors
    #[error("Server error: {message}")]
    Server { message: String },
}

impl BandMapError {
    /// HTTP status used when this error ends a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BandMapError::Config { .. } | BandMapError::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
            BandMapError::DataNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convenience type alias for Results with BandMapError
pub type Result<T> = std::result::Result<T, BandMapError>;
