use crate::chart::error::ChartError;
use crate::config::ConfigError;
use crate::model_chain::error::ModelError;
use crate::roughness::error::RoughnessError;
use crate::turbines::error::TurbineError;
use crate::weather_data::error::WeatherDataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindPowerError {
    #[error(transparent)]
    WeatherData(#[from] WeatherDataError),

    #[error(transparent)]
    Roughness(#[from] RoughnessError),

    #[error(transparent)]
    Turbine(#[from] TurbineError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WindPowerError {
    /// The request named something that does not exist: an unknown turbine type or a
    /// location outside the land-cover layer.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            WindPowerError::Roughness(RoughnessError::NoMatch { .. })
                | WindPowerError::Turbine(
                    TurbineError::UnknownType(_) | TurbineError::AmbiguousType { .. }
                )
        )
    }

    /// The request parameters themselves are unusable, or the model cannot run on them.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            WindPowerError::Model(_)
                | WindPowerError::Roughness(RoughnessError::InvalidCoordinate { .. })
                | WindPowerError::Turbine(TurbineError::InvalidHubHeight(_))
        )
    }
}
