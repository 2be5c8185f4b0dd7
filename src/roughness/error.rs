use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoughnessError {
    #[error("Land-cover layer '{0}' does not exist")]
    LayerNotFound(PathBuf),

    #[error("Unsupported land-cover layer format '{0}' (expected .shp, .geojson or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to read land-cover layer '{0}'")]
    LayerIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to read shapefile '{0}'")]
    ShapefileRead(PathBuf, #[source] shapefile::Error),

    #[error("Failed to parse GeoJSON layer '{0}'")]
    GeoJsonParse(PathBuf, #[source] Box<geojson::Error>),

    #[error("Land-cover layer '{0}' contains no polygons")]
    EmptyLayer(PathBuf),

    #[error("Record {record} of the land-cover layer has no 'roughness' attribute")]
    MissingRoughness { record: usize },

    #[error("Record {record} of the land-cover layer has an invalid roughness '{value}'")]
    InvalidRoughness { record: usize, value: String },

    #[error("Unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),

    #[error("Invalid query coordinate (latitude {latitude}, longitude {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    // Point outside every polygon: there is no defined roughness.
    #[error("No land-cover polygon contains latitude {latitude}, longitude {longitude}")]
    NoMatch { latitude: f64, longitude: f64 },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
