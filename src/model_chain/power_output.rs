use crate::model_chain::density::STANDARD_DENSITY;
use crate::model_chain::tools::{interp, interp_clamped};
use crate::types::turbine::PowerCurve;

const CORRECTION_SPEEDS: [f64; 2] = [7.5, 12.5];
const CORRECTION_EXPONENTS: [f64; 2] = [1.0 / 3.0, 2.0 / 3.0];

/// Power output (W) straight from the power curve.
pub fn power_curve(wind_speed: f64, curve: &PowerCurve) -> f64 {
    curve.power_at(wind_speed)
}

/// A power curve prepared for density correction.
///
/// The curve's wind speeds are scaled by `(1.225 / density)^e` where `e` grows from 1/3 at
/// 7.5 m/s to 2/3 at 12.5 m/s. The exponents only depend on the curve, so they are
/// computed once.
#[derive(Debug, Clone)]
pub struct DensityCorrectedCurve<'a> {
    curve: &'a PowerCurve,
    exponents: Vec<f64>,
}

impl<'a> DensityCorrectedCurve<'a> {
    pub fn new(curve: &'a PowerCurve) -> Self {
        let exponents = curve
            .wind_speeds()
            .iter()
            .map(|&v| interp_clamped(v, &CORRECTION_SPEEDS, &CORRECTION_EXPONENTS))
            .collect();
        Self { curve, exponents }
    }

    /// Power output (W) at `wind_speed` for air of `density` (kg/m³).
    pub fn power_at(&self, wind_speed: f64, density: f64) -> f64 {
        if wind_speed.is_nan() || density.is_nan() {
            return f64::NAN;
        }
        let ratio = STANDARD_DENSITY / density;
        let speeds: Vec<f64> = self
            .curve
            .wind_speeds()
            .iter()
            .zip(&self.exponents)
            .map(|(&v, &e)| v * ratio.powf(e))
            .collect();
        interp(wind_speed, &speeds, self.curve.values())
    }
}
