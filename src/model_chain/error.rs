use crate::types::weather_variable::WeatherVariable;
use crate::weather_data::error::WeatherDataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Weather data has no '{0}' column")]
    MissingVariable(WeatherVariable),

    #[error("Interpolating '{variable}' needs at least two heights, found {found}")]
    NotEnoughHeights {
        variable: WeatherVariable,
        found: usize,
    },

    #[error(
        "Obstacle displacement of {displacement} m reaches the {height} m measurement or hub height"
    )]
    ObstacleTooHigh { displacement: f64, height: f64 },

    #[error("'{variable}' measured at {height} m is not above the {displacement} m displacement height")]
    InvalidMeasurementHeight {
        variable: WeatherVariable,
        height: f64,
        displacement: f64,
    },

    #[error("Roughness length must be positive, got {0}")]
    InvalidRoughness(f64),

    #[error("Computed {values} power values for {timestamps} timestamps")]
    Misaligned { timestamps: usize, values: usize },

    #[error(transparent)]
    Weather(#[from] WeatherDataError),
}
