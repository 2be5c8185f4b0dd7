use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TurbineError {
    #[error("Unknown turbine type '{0}'")]
    UnknownType(String),

    #[error("Turbine type '{query}' is ambiguous, candidates: {}", candidates.join(", "))]
    AmbiguousType {
        query: String,
        candidates: Vec<String>,
    },

    #[error("Invalid power curve for turbine '{turbine_type}': {reason}")]
    InvalidPowerCurve {
        turbine_type: String,
        reason: String,
    },

    #[error("Hub height must be a positive finite number of meters, got {0}")]
    InvalidHubHeight(f64),

    #[error("Failed to parse turbine catalog")]
    CatalogParse(#[from] serde_json::Error),

    #[error("Unsupported turbine library '{0}', expected a JSON file or an oedb directory")]
    UnsupportedLibrary(PathBuf),

    #[error("Failed to read turbine library '{0}'")]
    LibraryIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to read turbine library table '{path}'")]
    LibraryCsv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Turbine library table '{path}' has no '{column}' column")]
    MissingLibraryColumn { path: PathBuf, column: String },

    #[error("Invalid value '{value}' in column '{column}' of '{path}'")]
    InvalidLibraryValue {
        path: PathBuf,
        column: String,
        value: String,
    },

    #[error("Failed processing turbine library: {0}")]
    LibraryFrame(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
