use crate::controllers::{
    chart_inline, download_chart, estimate_turbine, index, list_turbines, results,
};
use crate::state::AppState;
use axum::{routing::get, Router};
use std::path::Path;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn app_routes(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/results", get(results))
        .route("/_turbines", get(estimate_turbine))
        .route("/download", get(download_chart))
        .route("/chart", get(chart_inline))
        .route("/api/turbines", get(list_turbines))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
