//! demos/estimate_power.rs
//!
//! Estimates the output of an Enercon E-101 near Madison, WI from the sample weather file
//! and land-cover layer under `data/`, prints a summary and writes the chart.
//!
//! To run this example:
//! cargo run --example estimate_power

use windpower::{LatLon, WindPower, WindPowerConfig, WindPowerError};
use std::env;

#[tokio::main]
async fn main() -> Result<(), WindPowerError> {
    configure_polars_display();
    let client = WindPower::from_config(WindPowerConfig::from_env()?).await?;

    let rendered = client
        .estimate_and_render()
        .location(LatLon(43.0731, -89.4012))
        .turbine_type("E-101/3050")
        .hub_height(135.0)
        .call()
        .await?;

    let estimate = &rendered.estimate;
    println!(
        "{} at {} m, roughness {} m, {} weather rows",
        estimate.turbine.turbine_type(),
        estimate.turbine.hub_height,
        estimate.roughness_length,
        estimate.weather_rows
    );
    if let Some(series) = estimate.power_output() {
        let nominal = estimate.turbine.nominal_power();
        println!("Mean output: {:.0} W", series.mean().unwrap_or(f64::NAN));
        println!("Peak output: {:.0} W", series.max().unwrap_or(f64::NAN));
        println!("Energy: {:.1} MWh", series.energy_wh() / 1e6);
        println!(
            "Capacity factor: {:.1}%",
            series.capacity_factor(nominal).unwrap_or(f64::NAN) * 100.0
        );
        if let Ok(frame) = series.to_frame() {
            println!("{}", frame.head(Some(10)));
        }
    }
    println!("Chart written to {}", rendered.chart_path.display());

    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    // show 10 rows
    env::set_var("POLARS_FMT_MAX_ROWS", "10");
}
