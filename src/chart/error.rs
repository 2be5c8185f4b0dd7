use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Cannot chart an empty power series")]
    EmptySeries,

    #[error("Unsupported chart format for '{0}', use .png, .jpg or .bmp")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to prepare chart output '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to draw chart: {0}")]
    Drawing(String),

    #[error("Chart backend panicked while drawing")]
    BackendPanic,

    #[error("Failed to move finished chart into place at '{0}'")]
    Persist(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
