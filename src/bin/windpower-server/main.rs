mod controllers;
mod pages;
mod routes;
mod state;

use crate::routes::app_routes;
use crate::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;
use windpower::{WindPower, WindPowerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = WindPowerConfig::from_env()?;
    let static_dir = config.server.static_dir.clone();
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let client = WindPower::from_config(config).await?;
    info!(
        "Indexed {} land-cover polygons, {} turbine types",
        client.locator().len(),
        client.catalog().len()
    );

    let app = app_routes(AppState::new(client), &static_dir);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
