//! A windpowerlib-style model chain: wind speed, temperature and density at hub height,
//! then the turbine power curve.

pub mod chain;
pub mod density;
pub mod error;
pub mod power_output;
pub mod temperature;
pub mod tools;
pub mod wind_speed;
