//! HTML pages of the server, rendered with `format!`.

use axum::http::StatusCode;
use windpower::TurbineEstimate;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

/// Figures shown on the result page after a run.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateSummary {
    pub turbine_type: String,
    pub hub_height: f64,
    pub roughness_length: f64,
    pub weather_rows: usize,
    pub mean_power: Option<f64>,
    pub max_power: Option<f64>,
    pub energy_wh: f64,
    pub capacity_factor: Option<f64>,
}

impl From<&TurbineEstimate> for EstimateSummary {
    fn from(estimate: &TurbineEstimate) -> Self {
        let series = estimate.power_output();
        Self {
            turbine_type: estimate.turbine.turbine_type().to_string(),
            hub_height: estimate.turbine.hub_height,
            roughness_length: estimate.roughness_length,
            weather_rows: estimate.weather_rows,
            mean_power: series.and_then(|s| s.mean()),
            max_power: series.and_then(|s| s.max()),
            energy_wh: series.map(|s| s.energy_wh()).unwrap_or(0.0),
            capacity_factor: series
                .and_then(|s| s.capacity_factor(estimate.turbine.nominal_power())),
        }
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, head: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
  <link rel="stylesheet" href="/static/style.css">
  {head}
</head>
<body>
  <header><a href="/">Wind turbine power estimator</a></header>
  <main>
{body}
  </main>
</body>
</html>
"#,
        title = escape(title),
    )
}

/// The form page: a map to pick the location and the turbine inputs.
pub fn index(turbine_types: &[&str]) -> String {
    let options: String = turbine_types
        .iter()
        .map(|t| format!(r#"<option value="{0}">{0}</option>"#, escape(t)))
        .collect();
    let head = format!(
        r#"<link rel="stylesheet" href="{LEAFLET_CSS}">
  <script src="{LEAFLET_JS}"></script>
  <script src="/static/app.js" defer></script>"#
    );
    let body = format!(
        r#"    <div id="mapid"></div>
    <form action="/_turbines" method="get">
      <label>Latitude <input id="latitude" name="latitude" type="number" step="any" min="-90" max="90" required></label>
      <label>Longitude <input id="longitude" name="longitude" type="number" step="any" min="-180" max="180" required></label>
      <label>Turbine <select name="turb">{options}</select></label>
      <label>Hub height (m) <input name="hubHeight" type="number" step="any" min="1" value="135" required></label>
      <button type="submit">Estimate</button>
    </form>"#
    );
    layout("Wind turbine power estimator", &head, &body)
}

fn format_watts(value: Option<f64>) -> String {
    match value {
        Some(w) if w >= 1e6 => format!("{:.2} MW", w / 1e6),
        Some(w) => format!("{:.0} kW", w / 1e3),
        None => "n/a".to_string(),
    }
}

/// The result page; shows the current chart if there is one.
pub fn results(summary: Option<&EstimateSummary>, has_chart: bool) -> String {
    let table = summary
        .map(|s| {
            format!(
                r#"    <table class="summary">
      <tr><th>Turbine</th><td>{}</td></tr>
      <tr><th>Hub height</th><td>{} m</td></tr>
      <tr><th>Roughness length</th><td>{} m</td></tr>
      <tr><th>Weather records</th><td>{}</td></tr>
      <tr><th>Mean output</th><td>{}</td></tr>
      <tr><th>Peak output</th><td>{}</td></tr>
      <tr><th>Energy</th><td>{:.1} MWh</td></tr>
      <tr><th>Capacity factor</th><td>{}</td></tr>
    </table>
"#,
                escape(&s.turbine_type),
                s.hub_height,
                s.roughness_length,
                s.weather_rows,
                format_watts(s.mean_power),
                format_watts(s.max_power),
                s.energy_wh / 1e6,
                s.capacity_factor
                    .map(|c| format!("{:.1} %", c * 100.0))
                    .unwrap_or_else(|| "n/a".to_string()),
            )
        })
        .unwrap_or_default();

    let chart = if has_chart {
        r#"    <img class="chart" src="/chart" alt="Power output chart">
    <p><a href="/download">Download chart</a></p>"#
    } else {
        r#"    <p>No estimate has been run yet. <a href="/">Start one</a>.</p>"#
    };
    layout("Results", "", &format!("{table}{chart}"))
}

pub fn error(status: StatusCode, message: &str) -> String {
    let body = format!(
        r#"    <h1>{}</h1>
    <p class="error">{}</p>
    <p><a href="/">Back</a></p>"#,
        status,
        escape(message)
    );
    layout("Error", "", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<b>"E-101" & 'V90'</b>"#),
            "&lt;b&gt;&quot;E-101&quot; &amp; &#39;V90&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn index_lists_turbines() {
        let page = index(&["E-101/3050", "V90/2000"]);
        assert!(page.contains(r#"<option value="E-101/3050">E-101/3050</option>"#));
        assert!(page.contains(r#"name="hubHeight""#));
    }

    #[test]
    fn error_page_escapes_the_message() {
        let page = error(StatusCode::NOT_FOUND, "Unknown turbine type '<x>'");
        assert!(page.contains("404 Not Found"));
        assert!(page.contains("&lt;x&gt;"));
    }

    #[test]
    fn results_without_chart() {
        assert!(results(None, false).contains("No estimate has been run yet"));
        let summary = EstimateSummary {
            turbine_type: "E-101/3050".into(),
            hub_height: 135.0,
            roughness_length: 0.1,
            weather_rows: 24,
            mean_power: Some(1_500_000.0),
            max_power: Some(3_050_000.0),
            energy_wh: 36_000_000.0,
            capacity_factor: Some(0.49),
        };
        let page = results(Some(&summary), true);
        assert!(page.contains("3.05 MW"));
        assert!(page.contains("36.0 MWh"));
        assert!(page.contains(r#"src="/chart""#));
    }
}
