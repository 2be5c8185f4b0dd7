/// Specific gas constant of dry air, J/(kg K).
pub const GAS_CONSTANT_DRY_AIR: f64 = 287.058;
/// Air density at sea level in the standard atmosphere, kg/m³.
pub const STANDARD_DENSITY: f64 = 1.225;

const STANDARD_TEMPERATURE: f64 = 288.15;
const STANDARD_PRESSURE: f64 = 101_325.0;

/// Pressure (hPa) at hub height, assuming 1 hPa per 8 m.
fn pressure_hub_hpa(pressure: f64, pressure_height: f64, hub_height: f64) -> f64 {
    pressure / 100.0 - (hub_height - pressure_height) / 8.0
}

/// Air density (kg/m³) at hub height from the ideal gas equation.
///
/// `pressure` is in Pa at `pressure_height`, `temperature_hub` in K.
pub fn ideal_gas(
    pressure: f64,
    pressure_height: f64,
    hub_height: f64,
    temperature_hub: f64,
) -> f64 {
    pressure_hub_hpa(pressure, pressure_height, hub_height) * 100.0
        / (GAS_CONSTANT_DRY_AIR * temperature_hub)
}

/// Air density (kg/m³) at hub height from the barometric height equation.
pub fn barometric(
    pressure: f64,
    pressure_height: f64,
    hub_height: f64,
    temperature_hub: f64,
) -> f64 {
    pressure_hub_hpa(pressure, pressure_height, hub_height) * STANDARD_DENSITY
        * STANDARD_TEMPERATURE
        * 100.0
        / (STANDARD_PRESSURE * temperature_hub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_atmosphere_densities() {
        let t_hub = 288.15 - 0.65;
        let ideal = ideal_gas(101_325.0, 0.0, 100.0, t_hub);
        let baro = barometric(101_325.0, 0.0, 100.0, t_hub);
        assert!((ideal - 1.21260).abs() < 1e-4, "ideal = {ideal}");
        assert!((baro - 1.21262).abs() < 1e-4, "baro = {baro}");
    }

    #[test]
    fn sea_level_is_standard_density() {
        let rho = barometric(101_325.0, 0.0, 0.0, 288.15);
        assert!((rho - STANDARD_DENSITY).abs() < 1e-12);
    }
}
