//! The main entry point: estimate a turbine's power output at a location and chart it.

use crate::chart::error::ChartError;
use crate::chart::renderer::ChartRenderer;
use crate::config::WindPowerConfig;
use crate::error::WindPowerError;
use crate::model_chain::chain::ModelChain;
use crate::roughness::locate_roughness::RoughnessLocator;
use crate::turbines::catalog::TurbineCatalog;
use crate::types::power_series::PowerSeries;
use crate::types::turbine::WindTurbine;
use crate::weather_data::data_loader::WeatherDataLoader;
use bon::bon;
use chrono::{DateTime, Utc};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Represents a geographical coordinate using latitude and longitude (WGS 84 degrees).
///
/// # Examples
///
/// ```
/// use windpower::LatLon;
///
/// let madison = LatLon(43.0731, -89.4012);
/// assert_eq!(madison.0, 43.0731); // Latitude
/// assert_eq!(madison.1, -89.4012); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// An inclusive time window to restrict the weather series to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// The outcome of one estimation request.
#[derive(Debug, Clone)]
pub struct TurbineEstimate {
    /// The turbine, with its power output attached.
    pub turbine: WindTurbine,
    /// Roughness length (m) resolved at the location.
    pub roughness_length: f64,
    /// Number of weather rows the estimate was computed from.
    pub weather_rows: usize,
}

impl TurbineEstimate {
    pub fn power_output(&self) -> Option<&PowerSeries> {
        self.turbine.power_output.as_ref()
    }
}

/// A [`TurbineEstimate`] together with the chart drawn from it.
#[derive(Debug, Clone)]
pub struct RenderedEstimate {
    pub estimate: TurbineEstimate,
    pub chart_path: PathBuf,
}

/// The estimation client.
///
/// Holds the turbine catalog and the indexed land-cover layer, both loaded once and shared
/// read-only between requests. The weather file is re-read on every request.
///
/// # Examples
///
/// ```no_run
/// # use windpower::{LatLon, WindPower, WindPowerConfig, WindPowerError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), WindPowerError> {
/// let client = WindPower::from_config(WindPowerConfig::default()).await?;
/// let rendered = client
///     .estimate_and_render()
///     .location(LatLon(43.0731, -89.4012))
///     .turbine_type("E-101/3050")
///     .hub_height(135.0)
///     .call()
///     .await?;
/// println!("Chart written to {}", rendered.chart_path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WindPower {
    config: WindPowerConfig,
    catalog: Arc<TurbineCatalog>,
    locator: Arc<RoughnessLocator>,
    renderer: ChartRenderer,
}

#[bon]
impl WindPower {
    /// Loads the turbine catalog (the configured library, else the bundled one) and
    /// indexes the configured land-cover layer.
    pub async fn from_config(config: WindPowerConfig) -> Result<Self, WindPowerError> {
        let catalog = match &config.turbine_library {
            Some(path) => TurbineCatalog::load(path).await?,
            None => TurbineCatalog::bundled()?,
        };
        let locator = RoughnessLocator::from_path(
            &config.land_cover_file,
            config.land_cover_crs.clone(),
            config.overlap_policy,
        )
        .await?;
        Ok(Self::new(config, catalog, locator))
    }

    /// Assembles a client from parts that were loaded elsewhere.
    pub fn new(config: WindPowerConfig, catalog: TurbineCatalog, locator: RoughnessLocator) -> Self {
        let renderer = ChartRenderer::new(config.chart_path.clone(), config.chart_size());
        Self {
            config,
            catalog: Arc::new(catalog),
            locator: Arc::new(locator),
            renderer,
        }
    }

    pub fn config(&self) -> &WindPowerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TurbineCatalog {
        &self.catalog
    }

    pub fn locator(&self) -> &RoughnessLocator {
        &self.locator
    }

    /// Estimates the power output of a turbine at a location.
    ///
    /// Steps, each failing fast: look up the turbine type, resolve the roughness at the
    /// location, load the weather file, add the roughness column, run the model chain.
    ///
    /// # Arguments
    ///
    /// * `.location(LatLon)`: **Required.** Where the turbine stands.
    /// * `.turbine_type(&str)`: **Required.** A catalog identifier such as `"E-101/3050"`.
    /// * `.hub_height(f64)`: **Required.** Hub height in meters.
    /// * `.period(Period)`: *Optional.* Restricts the weather series.
    /// * `.model_chain(ModelChain)`: *Optional.* Defaults to [`ModelChain::default`].
    ///
    /// # Errors
    ///
    /// Lookup failures (unknown turbine, location outside every polygon) are reported
    /// before the weather file is touched; see [`WindPowerError::is_lookup`].
    #[builder]
    pub async fn estimate(
        &self,
        location: LatLon,
        turbine_type: &str,
        hub_height: f64,
        period: Option<Period>,
        model_chain: Option<ModelChain>,
    ) -> Result<TurbineEstimate, WindPowerError> {
        let started = Instant::now();

        let spec = self.catalog.lookup(turbine_type)?.clone();
        let mut turbine = WindTurbine::new(spec, hub_height)?;
        let roughness_length = self.locator.roughness_at(location.0, location.1)?;

        let mut weather = WeatherDataLoader::new(&self.config.weather_file)
            .load()
            .await?;
        if let Some(period) = period {
            weather = weather.filter_range(period.start, period.end)?;
        }
        let weather = weather.with_roughness(roughness_length)?;

        let chain = model_chain.unwrap_or_default();
        turbine.calculate_power_output(&chain, &weather)?;

        info!(
            "Estimated {} at {} m for ({}, {}) over {} rows in {:.2?}",
            turbine.turbine_type(),
            hub_height,
            location.0,
            location.1,
            weather.len(),
            started.elapsed()
        );
        Ok(TurbineEstimate {
            turbine,
            roughness_length,
            weather_rows: weather.len(),
        })
    }

    /// Like [`WindPower::estimate`], then writes the chart to the configured path.
    ///
    /// Nothing is written when the estimate fails.
    #[builder]
    pub async fn estimate_and_render(
        &self,
        location: LatLon,
        turbine_type: &str,
        hub_height: f64,
        period: Option<Period>,
        model_chain: Option<ModelChain>,
    ) -> Result<RenderedEstimate, WindPowerError> {
        let estimate = self
            .estimate()
            .location(location)
            .turbine_type(turbine_type)
            .hub_height(hub_height)
            .maybe_period(period)
            .maybe_model_chain(model_chain)
            .call()
            .await?;

        let series = estimate.power_output().ok_or(ChartError::EmptySeries)?;
        let chart_path = self
            .renderer
            .render(series, estimate.turbine.turbine_type())
            .await?;
        Ok(RenderedEstimate {
            estimate,
            chart_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roughness::error::RoughnessError;
    use crate::turbines::error::TurbineError;
    use chrono::{Duration, TimeZone};
    use std::fmt::Write as _;
    use std::path::Path;
    use tempfile::TempDir;

    const LAYER: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"roughness": 0.1},
             "geometry": {"type": "Polygon", "coordinates": [[[-89.6, 42.9], [-89.2, 42.9], [-89.2, 43.2], [-89.6, 43.2], [-89.6, 42.9]]]}}
        ]
    }"#;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap()
    }

    fn write_weather(path: &Path) {
        let mut csv = String::from(
            "variable_name,pressure,temperature,wind_speed,temperature,wind_speed\n\
             height,0,2,10,10,80\n",
        );
        for hour in 0..24 {
            let t = start() + Duration::hours(hour);
            let v10 = 2.0 + hour as f64 * 0.4;
            writeln!(
                csv,
                "{},98400.0,267.6,{:.3},267.5,{:.3}",
                t.format("%Y-%m-%d %H:%M:%S"),
                v10,
                v10 * 1.4
            )
            .unwrap();
        }
        std::fs::write(path, csv).unwrap();
    }

    async fn client(dir: &TempDir) -> WindPower {
        let weather_file = dir.path().join("weather.csv");
        let land_cover_file = dir.path().join("landcover.geojson");
        write_weather(&weather_file);
        std::fs::write(&land_cover_file, LAYER).unwrap();

        let config = WindPowerConfig {
            weather_file,
            land_cover_file,
            chart_path: dir.path().join("static").join("turbine_output.png"),
            chart_width: 640,
            chart_height: 360,
            ..WindPowerConfig::default()
        };
        WindPower::from_config(config).await.unwrap()
    }

    #[tokio::test]
    async fn estimate_and_render_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(&dir).await;

        let rendered = client
            .estimate_and_render()
            .location(LatLon(43.0731, -89.4012))
            .turbine_type("E-101")
            .hub_height(135.0)
            .call()
            .await
            .unwrap();

        let estimate = &rendered.estimate;
        assert_eq!(estimate.roughness_length, 0.1);
        assert_eq!(estimate.weather_rows, 24);
        assert_eq!(estimate.turbine.turbine_type(), "E-101/3050");

        let series = estimate.power_output().unwrap();
        assert_eq!(series.len(), 24);
        for v in series.values() {
            assert!((0.0..=3_050_000.0).contains(v), "{v}");
        }
        assert!(series.max().unwrap() > 0.0);

        assert_eq!(rendered.chart_path, client.config().chart_path);
        assert!(std::fs::metadata(&rendered.chart_path).unwrap().len() > 0);
    }

    #[tokio::test]
    async fn period_restricts_the_series() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(&dir).await;

        let estimate = client
            .estimate()
            .location(LatLon(43.0731, -89.4012))
            .turbine_type("E-101/3050")
            .hub_height(80.0)
            .period(Period::new(
                start() + Duration::hours(6),
                start() + Duration::hours(11),
            ))
            .call()
            .await
            .unwrap();

        assert_eq!(estimate.weather_rows, 6);
        assert_eq!(
            estimate.power_output().unwrap().timestamps()[0],
            start() + Duration::hours(6)
        );
    }

    #[tokio::test]
    async fn lookup_failures_write_no_chart() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(&dir).await;

        let err = client
            .estimate_and_render()
            .location(LatLon(43.0731, -89.4012))
            .turbine_type("NotATurbine")
            .hub_height(135.0)
            .call()
            .await
            .unwrap_err();
        assert!(err.is_lookup());
        assert!(matches!(
            err,
            WindPowerError::Turbine(TurbineError::UnknownType(_))
        ));

        let err = client
            .estimate_and_render()
            .location(LatLon(40.0, -80.0))
            .turbine_type("E-101/3050")
            .hub_height(135.0)
            .call()
            .await
            .unwrap_err();
        assert!(err.is_lookup());
        assert!(matches!(
            err,
            WindPowerError::Roughness(RoughnessError::NoMatch { .. })
        ));

        assert!(!client.config().chart_path.exists());
    }

    #[tokio::test]
    async fn configured_turbine_library_replaces_the_bundled_one() {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("library.json");
        std::fs::write(
            &library,
            r#"[{"turbine_type": "N131/3600", "manufacturer": "Nordex", "nominal_power": 3600.0,
                 "power_curve_wind_speeds": [3.0, 12.0, 25.0],
                 "power_curve_values": [0.0, 3600.0, 3600.0]}]"#,
        )
        .unwrap();
        let weather_file = dir.path().join("weather.csv");
        let land_cover_file = dir.path().join("landcover.geojson");
        write_weather(&weather_file);
        std::fs::write(&land_cover_file, LAYER).unwrap();

        let client = WindPower::from_config(WindPowerConfig {
            weather_file,
            land_cover_file,
            turbine_library: Some(library),
            ..WindPowerConfig::default()
        })
        .await
        .unwrap();
        assert_eq!(client.catalog().turbine_types(), vec!["N131/3600"]);

        let estimate = client
            .estimate()
            .location(LatLon(43.0731, -89.4012))
            .turbine_type("N131")
            .hub_height(120.0)
            .call()
            .await
            .unwrap();
        assert_eq!(estimate.power_output().unwrap().len(), 24);

        let err = client
            .estimate()
            .location(LatLon(43.0731, -89.4012))
            .turbine_type("E-101/3050")
            .hub_height(120.0)
            .call()
            .await
            .unwrap_err();
        assert!(err.is_lookup());
    }

    #[tokio::test]
    async fn turbine_is_checked_before_weather_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(&dir).await;
        std::fs::remove_file(&client.config().weather_file).unwrap();

        let err = client
            .estimate()
            .location(LatLon(43.0731, -89.4012))
            .turbine_type("NotATurbine")
            .hub_height(135.0)
            .call()
            .await
            .unwrap_err();
        assert!(matches!(err, WindPowerError::Turbine(_)));

        let err = client
            .estimate()
            .location(LatLon(43.0731, -89.4012))
            .turbine_type("E-101/3050")
            .hub_height(135.0)
            .call()
            .await
            .unwrap_err();
        assert!(matches!(err, WindPowerError::WeatherData(_)));
    }
}
