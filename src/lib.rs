mod chart;
mod config;
mod error;
mod model_chain;
mod roughness;
mod turbines;
mod types;
mod utils;
mod weather_data;
mod wind_power;

pub use error::WindPowerError;
pub use wind_power::*;

pub use config::{ConfigError, ServerConfig, WindPowerConfig, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};

pub use chart::error::ChartError;
pub use chart::renderer::ChartRenderer;

pub use model_chain::chain::*;
pub use model_chain::error::ModelError;

pub use roughness::crs::LayerCrs;
pub use roughness::error::RoughnessError;
pub use roughness::layer_reader::{read_land_cover, LandCoverLayer};
pub use roughness::locate_roughness::RoughnessLocator;

pub use turbines::catalog::TurbineCatalog;
pub use turbines::error::TurbineError;

pub use types::land_cover::{LandCoverPolygon, OverlapPolicy};
pub use types::power_series::{PowerSeries, POWER_OUTPUT_COLUMN};
pub use types::turbine::{PowerCurve, TurbineSpec, WindTurbine};
pub use types::weather_frame::{WeatherFrame, DATETIME_COLUMN};
pub use types::weather_variable::{ColumnKey, WeatherVariable};

pub use weather_data::data_loader::{read_weather_csv, WeatherDataLoader};
pub use weather_data::enricher::enrich_with_roughness;
pub use weather_data::error::WeatherDataError;
