use crate::types::land_cover::OverlapPolicy;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the configuration file of the server.
pub const CONFIG_ENV_VAR: &str = "WINDPOWER_CONFIG";
/// Configuration file looked for in the working directory when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse configuration file '{0}'")]
    Parse(PathBuf, #[source] serde_json::Error),
}

/// Where the estimator finds its inputs and writes its chart.
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindPowerConfig {
    pub weather_file: PathBuf,
    pub land_cover_file: PathBuf,
    /// `EPSG:` code overriding the reference system declared by the land-cover layer.
    pub land_cover_crs: Option<String>,
    /// Turbine library to use in place of the bundled one: a JSON file in the bundled
    /// layout, or a directory with windpowerlib's oedb cache files.
    pub turbine_library: Option<PathBuf>,
    pub chart_path: PathBuf,
    pub chart_width: u32,
    pub chart_height: u32,
    pub overlap_policy: OverlapPolicy,
    pub server: ServerConfig,
}

impl Default for WindPowerConfig {
    fn default() -> Self {
        Self {
            weather_file: PathBuf::from("data/weather.csv"),
            land_cover_file: PathBuf::from("data/landcover.geojson"),
            land_cover_crs: None,
            turbine_library: None,
            chart_path: PathBuf::from("static/turbine_output.png"),
            chart_width: 1280,
            chart_height: 720,
            overlap_policy: OverlapPolicy::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl WindPowerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config =
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reads the file named by `WINDPOWER_CONFIG`, else `config.json` when present, else
    /// falls back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&path));
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            return Self::load(fallback);
        }
        info!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    pub fn chart_size(&self) -> (u32, u32) {
        (self.chart_width, self.chart_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_is_all_defaults() {
        let config: WindPowerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, WindPowerConfig::default());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.chart_size(), (1280, 720));
    }

    #[test]
    fn partial_files_override_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"land_cover_file": "layers/cover.shp", "land_cover_crs": "EPSG:32616",
                "overlap_policy": "smallest_area", "turbine_library": "data/oedb",
                "server": {{"port": 8080}}}}"#
        )
        .unwrap();

        let config = WindPowerConfig::load(file.path()).unwrap();
        assert_eq!(config.land_cover_file, PathBuf::from("layers/cover.shp"));
        assert_eq!(config.land_cover_crs.as_deref(), Some("EPSG:32616"));
        assert_eq!(config.overlap_policy, OverlapPolicy::SmallestArea);
        assert_eq!(config.turbine_library, Some(PathBuf::from("data/oedb")));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.weather_file, PathBuf::from("data/weather.csv"));
    }

    #[test]
    fn unreadable_and_invalid_files() {
        assert!(matches!(
            WindPowerConfig::load(Path::new("/nope/config.json")),
            Err(ConfigError::Read(..))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            WindPowerConfig::load(file.path()),
            Err(ConfigError::Parse(..))
        ));
    }
}
