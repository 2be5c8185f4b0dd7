use crate::pages::{self, EstimateSummary};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::path::Path;
use tracing::{error, warn};
use windpower::{LatLon, WindPowerError};

/// Query of `GET /_turbines`, named like the form fields.
#[derive(Debug, Deserialize)]
pub struct TurbineQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub turb: String,
    #[serde(rename = "hubHeight")]
    pub hub_height: f64,
}

/// An error rendered as a small HTML page.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<WindPowerError> for AppError {
    fn from(err: WindPowerError) -> Self {
        let status = if err.is_lookup() {
            StatusCode::NOT_FOUND
        } else if err.is_invalid_input() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        if status.is_server_error() {
            error!("Estimation failed: {}", message);
        } else {
            warn!("Rejected request: {}", message);
        }
        Self::new(status, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Html(pages::error(self.status, &self.message))).into_response()
    }
}

/// GET /
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(pages::index(&state.client.catalog().turbine_types()))
}

/// GET /results
pub async fn results(State(state): State<AppState>) -> Html<String> {
    let has_chart = state.client.config().chart_path.is_file();
    Html(pages::results(None, has_chart))
}

/// GET /_turbines?latitude=..&longitude=..&turb=..&hubHeight=..
///
/// Runs the whole pipeline and answers with the result page. Runs are serialised.
pub async fn estimate_turbine(
    State(state): State<AppState>,
    query: Result<Query<TurbineQuery>, QueryRejection>,
) -> Result<Html<String>, AppError> {
    let Query(query) =
        query.map_err(|e| AppError::new(StatusCode::UNPROCESSABLE_ENTITY, e.body_text()))?;

    let _guard = state.pipeline.lock().await;
    let rendered = state
        .client
        .estimate_and_render()
        .location(LatLon(query.latitude, query.longitude))
        .turbine_type(&query.turb)
        .hub_height(query.hub_height)
        .call()
        .await?;

    let summary = EstimateSummary::from(&rendered.estimate);
    Ok(Html(pages::results(Some(&summary), true)))
}

/// GET /download
pub async fn download_chart(State(state): State<AppState>) -> Result<Response, AppError> {
    chart_response(&state.client.config().chart_path, true).await
}

/// GET /chart
pub async fn chart_inline(State(state): State<AppState>) -> Result<Response, AppError> {
    chart_response(&state.client.config().chart_path, false).await
}

/// GET /api/turbines
pub async fn list_turbines(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(
        state
            .client
            .catalog()
            .turbine_types()
            .into_iter()
            .map(str::to_string)
            .collect(),
    )
}

async fn chart_response(path: &Path, attachment: bool) -> Result<Response, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::new(StatusCode::NOT_FOUND, "No chart has been rendered yet")
        } else {
            error!("Failed to read chart {}: {}", path.display(), e);
            AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read chart")
        }
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(path)),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if attachment {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("turbine_output.png");
        let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
            .map_err(|e| AppError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    Ok((headers, bytes).into_response())
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("bmp") => "image/bmp",
        _ => "image/png",
    }
}
