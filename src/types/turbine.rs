//! Turbine specifications from the catalog and the per-request turbine entity.

use crate::model_chain::chain::ModelChain;
use crate::model_chain::error::ModelError;
use crate::model_chain::tools::interp;
use crate::turbines::error::TurbineError;
use crate::types::power_series::PowerSeries;
use crate::types::weather_frame::WeatherFrame;
use serde::{Deserialize, Serialize};

/// A turbine's power curve: electrical output (W) as a function of hub-height wind speed (m/s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerCurve {
    wind_speed: Vec<f64>,
    value: Vec<f64>,
}

impl PowerCurve {
    /// Wind speeds must be strictly increasing and values finite and non-negative.
    pub fn new(
        turbine_type: &str,
        wind_speed: Vec<f64>,
        value: Vec<f64>,
    ) -> Result<Self, TurbineError> {
        let invalid = |reason: &str| TurbineError::InvalidPowerCurve {
            turbine_type: turbine_type.to_string(),
            reason: reason.to_string(),
        };
        if wind_speed.len() != value.len() {
            return Err(invalid("wind speeds and values differ in length"));
        }
        if wind_speed.len() < 2 {
            return Err(invalid("at least two points are required"));
        }
        if wind_speed.iter().any(|v| !v.is_finite())
            || wind_speed.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(invalid("wind speeds must be finite and strictly increasing"));
        }
        if value.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(invalid("power values must be finite and non-negative"));
        }
        Ok(Self { wind_speed, value })
    }

    pub fn wind_speeds(&self) -> &[f64] {
        &self.wind_speed
    }

    pub fn values(&self) -> &[f64] {
        &self.value
    }

    /// Highest output on the curve.
    pub fn max_power(&self) -> f64 {
        self.value.iter().copied().fold(0.0, f64::max)
    }

    /// Output at `wind_speed`, linearly interpolated; zero outside the curve.
    pub fn power_at(&self, wind_speed: f64) -> f64 {
        interp(wind_speed, &self.wind_speed, &self.value)
    }
}

/// A catalog entry describing one turbine type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurbineSpec {
    /// Identifier such as `"E-101/3050"`.
    pub turbine_type: String,
    pub manufacturer: String,
    /// Rated power in W.
    pub nominal_power: f64,
    /// Rotor diameter in m, if known.
    pub rotor_diameter: Option<f64>,
    /// Hub heights the manufacturer offers, in m.
    pub hub_heights: Vec<f64>,
    pub power_curve: PowerCurve,
}

/// A turbine of a given type at a given hub height.
///
/// `power_output` is filled in by [`WindTurbine::calculate_power_output`] and lives as long
/// as the turbine does.
#[derive(Debug, Clone)]
pub struct WindTurbine {
    pub spec: TurbineSpec,
    /// Hub height in m.
    pub hub_height: f64,
    pub power_output: Option<PowerSeries>,
}

impl WindTurbine {
    pub fn new(spec: TurbineSpec, hub_height: f64) -> Result<Self, TurbineError> {
        if !hub_height.is_finite() || hub_height <= 0.0 {
            return Err(TurbineError::InvalidHubHeight(hub_height));
        }
        Ok(Self {
            spec,
            hub_height,
            power_output: None,
        })
    }

    pub fn turbine_type(&self) -> &str {
        &self.spec.turbine_type
    }

    pub fn nominal_power(&self) -> f64 {
        self.spec.nominal_power
    }

    /// Runs `chain` on `weather` and stores the result on the turbine.
    pub fn calculate_power_output(
        &mut self,
        chain: &ModelChain,
        weather: &WeatherFrame,
    ) -> Result<&PowerSeries, ModelError> {
        let series = chain.run_model(self, weather)?;
        Ok(self.power_output.insert(series))
    }
}
