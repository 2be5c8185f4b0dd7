use crate::model_chain::density::{barometric, ideal_gas};
use crate::model_chain::error::ModelError;
use crate::model_chain::power_output::{power_curve, DensityCorrectedCurve};
use crate::model_chain::temperature::linear_gradient;
use crate::model_chain::tools::{
    closest_height, linear_interpolation_extrapolation, two_closest_heights,
};
use crate::model_chain::wind_speed::{hellman, logarithmic_profile, DISPLACEMENT_FACTOR};
use crate::types::power_series::PowerSeries;
use crate::types::turbine::WindTurbine;
use crate::types::weather_frame::WeatherFrame;
use crate::types::weather_variable::{ColumnKey, WeatherVariable};
use bon::bon;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindSpeedModel {
    #[default]
    Logarithmic,
    Hellman,
    InterpolationExtrapolation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityModel {
    #[default]
    IdealGas,
    Barometric,
    InterpolationExtrapolation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureModel {
    #[default]
    LinearGradient,
    InterpolationExtrapolation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerOutputModel {
    #[default]
    PowerCurve,
}

/// Computes a turbine's power output from a weather series.
///
/// Each hub-height quantity is read straight from the data when a column exists at exactly
/// the hub height; otherwise the configured sub-model derives it from the closest
/// measurement height (or the two closest, for interpolation).
///
/// ```no_run
/// use windpower::{DensityModel, ModelChain, WindSpeedModel};
///
/// let chain = ModelChain::builder()
///     .wind_speed_model(WindSpeedModel::Hellman)
///     .density_model(DensityModel::Barometric)
///     .density_correction(false)
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelChain {
    pub wind_speed_model: WindSpeedModel,
    pub density_model: DensityModel,
    pub temperature_model: TemperatureModel,
    pub power_output_model: PowerOutputModel,
    pub density_correction: bool,
    /// Height of obstacles around the turbine, m.
    pub obstacle_height: f64,
    /// Fixed Hellman exponent; derived from the roughness when absent.
    pub hellman_exponent: Option<f64>,
}

impl Default for ModelChain {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[bon]
impl ModelChain {
    #[builder]
    pub fn new(
        #[builder(default)] wind_speed_model: WindSpeedModel,
        #[builder(default)] density_model: DensityModel,
        #[builder(default)] temperature_model: TemperatureModel,
        #[builder(default)] power_output_model: PowerOutputModel,
        #[builder(default = true)] density_correction: bool,
        #[builder(default)] obstacle_height: f64,
        hellman_exponent: Option<f64>,
    ) -> Self {
        Self {
            wind_speed_model,
            density_model,
            temperature_model,
            power_output_model,
            density_correction,
            obstacle_height,
            hellman_exponent,
        }
    }

    /// Runs the chain for `turbine` on `weather`.
    ///
    /// The result has one value (W) per weather timestamp; rows with a missing input are
    /// `NaN`. The same inputs always give the same output.
    pub fn run_model(
        &self,
        turbine: &WindTurbine,
        weather: &WeatherFrame,
    ) -> Result<PowerSeries, ModelError> {
        let hub_height = turbine.hub_height;
        let timestamps = weather.timestamps()?;
        let wind_speed = self.wind_speed_hub(weather, hub_height)?;
        let curve = &turbine.spec.power_curve;

        let values: Vec<f64> = match self.power_output_model {
            PowerOutputModel::PowerCurve if self.density_correction => {
                let density = self.density_hub(weather, hub_height)?;
                let corrected = DensityCorrectedCurve::new(curve);
                wind_speed
                    .iter()
                    .zip(&density)
                    .map(|(&v, &rho)| corrected.power_at(v, rho))
                    .collect()
            }
            PowerOutputModel::PowerCurve => {
                wind_speed.iter().map(|&v| power_curve(v, curve)).collect()
            }
        };

        debug!(
            "Computed {} power values for {} at {} m",
            values.len(),
            turbine.turbine_type(),
            hub_height
        );
        let (n_timestamps, n_values) = (timestamps.len(), values.len());
        PowerSeries::new(timestamps, values).ok_or(ModelError::Misaligned {
            timestamps: n_timestamps,
            values: n_values,
        })
    }

    /// Wind speed (m/s) at hub height.
    pub fn wind_speed_hub(
        &self,
        weather: &WeatherFrame,
        hub_height: f64,
    ) -> Result<Vec<f64>, ModelError> {
        let variable = WeatherVariable::WindSpeed;
        let heights = heights_of(weather, &variable)?;
        if let Some(h) = exact_height(&heights, hub_height) {
            return column(weather, &variable, h);
        }

        match self.wind_speed_model {
            WindSpeedModel::Logarithmic => {
                let h = nearest(&heights, hub_height, &variable)?;
                let data_height = f64::from(h);
                self.check_profile_heights(&variable, data_height, hub_height)?;
                let roughness = roughness_length(weather)?
                    .ok_or(ModelError::MissingVariable(WeatherVariable::RoughnessLength))?;
                debug!("Logarithmic wind profile from {} m to {} m", h, hub_height);

                let wind = column(weather, &variable, h)?;
                Ok(wind
                    .iter()
                    .zip(&roughness)
                    .map(|(&v, &z0)| {
                        logarithmic_profile(v, data_height, hub_height, z0, self.obstacle_height)
                    })
                    .collect())
            }
            WindSpeedModel::Hellman => {
                let h = nearest(&heights, hub_height, &variable)?;
                let data_height = f64::from(h);
                if data_height <= 0.0 {
                    return Err(ModelError::InvalidMeasurementHeight {
                        variable,
                        height: data_height,
                        displacement: 0.0,
                    });
                }
                debug!("Hellman wind profile from {} m to {} m", h, hub_height);

                let wind = column(weather, &variable, h)?;
                let values = match roughness_length(weather)? {
                    Some(roughness) => wind
                        .iter()
                        .zip(&roughness)
                        .map(|(&v, &z0)| {
                            hellman(v, data_height, hub_height, Some(z0), self.hellman_exponent)
                        })
                        .collect(),
                    None => wind
                        .iter()
                        .map(|&v| hellman(v, data_height, hub_height, None, self.hellman_exponent))
                        .collect(),
                };
                Ok(values)
            }
            WindSpeedModel::InterpolationExtrapolation => {
                interpolated(weather, &variable, &heights, hub_height)
            }
        }
    }

    /// Air temperature (K) at hub height.
    pub fn temperature_hub(
        &self,
        weather: &WeatherFrame,
        hub_height: f64,
    ) -> Result<Vec<f64>, ModelError> {
        let variable = WeatherVariable::Temperature;
        let heights = heights_of(weather, &variable)?;
        if let Some(h) = exact_height(&heights, hub_height) {
            return column(weather, &variable, h);
        }

        match self.temperature_model {
            TemperatureModel::LinearGradient => {
                let h = nearest(&heights, hub_height, &variable)?;
                let temperature = column(weather, &variable, h)?;
                Ok(temperature
                    .iter()
                    .map(|&t| linear_gradient(t, f64::from(h), hub_height))
                    .collect())
            }
            TemperatureModel::InterpolationExtrapolation => {
                interpolated(weather, &variable, &heights, hub_height)
            }
        }
    }

    /// Air density (kg/m³) at hub height.
    pub fn density_hub(
        &self,
        weather: &WeatherFrame,
        hub_height: f64,
    ) -> Result<Vec<f64>, ModelError> {
        let formula: fn(f64, f64, f64, f64) -> f64 = match self.density_model {
            DensityModel::InterpolationExtrapolation => {
                let variable = WeatherVariable::Density;
                let heights = heights_of(weather, &variable)?;
                return interpolated(weather, &variable, &heights, hub_height);
            }
            DensityModel::IdealGas => ideal_gas,
            DensityModel::Barometric => barometric,
        };

        let temperature = self.temperature_hub(weather, hub_height)?;
        let variable = WeatherVariable::Pressure;
        let heights = heights_of(weather, &variable)?;
        let h = nearest(&heights, hub_height, &variable)?;
        let pressure = column(weather, &variable, h)?;

        Ok(pressure
            .iter()
            .zip(&temperature)
            .map(|(&p, &t)| formula(p, f64::from(h), hub_height, t))
            .collect())
    }

    /// The logarithmic profile needs both heights above the obstacle displacement.
    fn check_profile_heights(
        &self,
        variable: &WeatherVariable,
        data_height: f64,
        hub_height: f64,
    ) -> Result<(), ModelError> {
        let displacement = DISPLACEMENT_FACTOR * self.obstacle_height;
        for height in [data_height, hub_height] {
            if displacement > height {
                return Err(ModelError::ObstacleTooHigh {
                    displacement,
                    height,
                });
            }
        }
        if data_height <= displacement {
            return Err(ModelError::InvalidMeasurementHeight {
                variable: variable.clone(),
                height: data_height,
                displacement,
            });
        }
        if hub_height <= displacement {
            return Err(ModelError::ObstacleTooHigh {
                displacement,
                height: hub_height,
            });
        }
        Ok(())
    }
}

fn heights_of(weather: &WeatherFrame, variable: &WeatherVariable) -> Result<Vec<u32>, ModelError> {
    let heights = weather.heights(variable);
    if heights.is_empty() {
        return Err(ModelError::MissingVariable(variable.clone()));
    }
    Ok(heights)
}

fn exact_height(heights: &[u32], hub_height: f64) -> Option<u32> {
    heights
        .iter()
        .copied()
        .find(|&h| f64::from(h) == hub_height)
}

fn nearest(heights: &[u32], hub_height: f64, variable: &WeatherVariable) -> Result<u32, ModelError> {
    closest_height(heights, hub_height).ok_or_else(|| ModelError::MissingVariable(variable.clone()))
}

fn column(
    weather: &WeatherFrame,
    variable: &WeatherVariable,
    height: u32,
) -> Result<Vec<f64>, ModelError> {
    Ok(weather.values(&ColumnKey::new(variable.clone(), height))?)
}

/// The first roughness column, if any. Missing rows stay `NaN`.
fn roughness_length(weather: &WeatherFrame) -> Result<Option<Vec<f64>>, ModelError> {
    let variable = WeatherVariable::RoughnessLength;
    let Some(&height) = weather.heights(&variable).first() else {
        return Ok(None);
    };
    let values = column(weather, &variable, height)?;
    if let Some(&bad) = values.iter().find(|z0| z0.is_finite() && **z0 <= 0.0) {
        return Err(ModelError::InvalidRoughness(bad));
    }
    Ok(Some(values))
}

fn interpolated(
    weather: &WeatherFrame,
    variable: &WeatherVariable,
    heights: &[u32],
    hub_height: f64,
) -> Result<Vec<f64>, ModelError> {
    if let Some(h) = exact_height(heights, hub_height) {
        return column(weather, variable, h);
    }
    let (h1, h2) =
        two_closest_heights(heights, hub_height).ok_or_else(|| ModelError::NotEnoughHeights {
            variable: variable.clone(),
            found: heights.len(),
        })?;
    debug!(
        "Interpolating {} at {} m from {} m and {} m",
        variable, hub_height, h1, h2
    );

    let v1 = column(weather, variable, h1)?;
    let v2 = column(weather, variable, h2)?;
    Ok(v1
        .iter()
        .zip(&v2)
        .map(|(&a, &b)| {
            linear_interpolation_extrapolation(a, f64::from(h1), b, f64::from(h2), hub_height)
        })
        .collect())
}
