/// Temperature lapse rate of the standard atmosphere, K/m.
pub const TEMPERATURE_GRADIENT: f64 = -0.0065;

/// Temperature (K) at `hub_height`, from `temperature` measured at `data_height`.
pub fn linear_gradient(temperature: f64, data_height: f64, hub_height: f64) -> f64 {
    temperature + TEMPERATURE_GRADIENT * (hub_height - data_height)
}
