pub mod land_cover;
pub mod power_series;
pub mod turbine;
pub mod weather_frame;
pub mod weather_variable;
