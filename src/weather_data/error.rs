use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherDataError {
    #[error("Weather file '{0}' does not exist")]
    FileNotFound(PathBuf),

    // Errors during CSV reading (inside blocking task)
    #[error("Parsing error reading weather CSV '{path}'")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Weather file '{0}' has no data rows")]
    Empty(PathBuf),

    #[error("Malformed header in weather file '{path}': {message}")]
    MalformedHeader { path: PathBuf, message: String },

    #[error("Invalid measurement height '{value}' for variable '{variable}'")]
    InvalidHeight { variable: String, value: String },

    #[error("Invalid timestamp '{value}' on data row {row}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("Invalid number '{value}' in column '{column}' on data row {row}")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Timestamps are not strictly increasing at data row {row} ({timestamp})")]
    NonMonotonicTimestamps { row: usize, timestamp: String },

    #[error("Required column '{0}' not found in weather frame")]
    ColumnNotFound(String),

    #[error("Roughness length must be a positive finite number, got {0}")]
    InvalidRoughness(f64),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
