use crate::chart::error::ChartError;
use crate::chart::font_safe::FontSafeBackend;
use crate::types::power_series::PowerSeries;
use crate::utils::ensure_parent_dir_exists;
use chrono::{DateTime, Duration, Utc};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::panic;
use std::path::{Path, PathBuf};

const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];
const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Draws a power series as a line chart and writes it to a fixed path.
///
/// The image is drawn into a temporary file next to the target and renamed over it when
/// complete, so a concurrent reader sees either the previous chart or the new one.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    path: PathBuf,
    size: (u32, u32),
}

impl ChartRenderer {
    pub fn new(path: impl Into<PathBuf>, size: (u32, u32)) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renders on a blocking task and returns the written path.
    pub async fn render(&self, series: &PowerSeries, label: &str) -> Result<PathBuf, ChartError> {
        let renderer = self.clone();
        let series = series.clone();
        let label = label.to_string();
        tokio::task::spawn_blocking(move || renderer.render_blocking(&series, &label)).await?
    }

    pub fn render_blocking(&self, series: &PowerSeries, label: &str) -> Result<PathBuf, ChartError> {
        if series.is_empty() {
            return Err(ChartError::EmptySeries);
        }
        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .filter(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
            .ok_or_else(|| ChartError::UnsupportedFormat(self.path.clone()))?;

        ensure_parent_dir_exists(&self.path).map_err(|e| ChartError::Io(self.path.clone(), e))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(".chart-")
            .suffix(&format!(".{extension}"))
            .tempfile_in(&dir)
            .map_err(|e| ChartError::Io(dir.clone(), e))?;

        let drawn = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            let backend = BitMapBackend::new(staging.path(), self.size);
            let root = FontSafeBackend::new(backend).into_drawing_area();
            draw_power_chart(root, series, label).map_err(|e| ChartError::Drawing(e.to_string()))
        }));
        drawn.map_err(|_| ChartError::BackendPanic)??;

        staging
            .persist(&self.path)
            .map_err(|e| ChartError::Persist(self.path.clone(), e.error))?;
        info!("Wrote power chart to {}", self.path.display());
        Ok(self.path.clone())
    }
}

fn hours_since(start: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
    (t - start).num_milliseconds() as f64 / 3_600_000.0
}

fn draw_power_chart<DB>(
    root: DrawingArea<DB, Shift>,
    series: &PowerSeries,
    label: &str,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let timestamps = series.timestamps();
    let start = timestamps[0];
    let x_max = timestamps
        .last()
        .map(|&t| hours_since(start, t))
        .unwrap_or(0.0)
        .max(1.0);
    let y_max = series.max().unwrap_or(0.0).max(1.0) * 1.05;

    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    let format_time = move |h: &f64| {
        (start + Duration::minutes((h * 60.0).round() as i64))
            .format("%Y-%m-%d %H:%M")
            .to_string()
    };
    chart
        .configure_mesh()
        .x_desc("Time (UTC)")
        .y_desc("Power (W)")
        .label_style(("sans-serif", 12))
        .axis_desc_style(("sans-serif", 18))
        .x_labels(6)
        .x_label_formatter(&format_time)
        .y_label_formatter(&|v| format!("{:.0}", v))
        .draw()?;

    // Missing values break the line instead of dragging it to zero.
    let mut segments: Vec<Vec<(f64, f64)>> = vec![Vec::new()];
    for (t, v) in series.iter() {
        if v.is_finite() {
            if let Some(segment) = segments.last_mut() {
                segment.push((hours_since(start, t), v));
            }
        } else if segments.last().is_some_and(|s| !s.is_empty()) {
            segments.push(Vec::new());
        }
    }

    let mut labelled = false;
    for segment in segments.into_iter().filter(|s| !s.is_empty()) {
        let drawn = chart.draw_series(LineSeries::new(segment, LINE_COLOR.stroke_width(2)))?;
        if !labelled {
            drawn
                .label(label)
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LINE_COLOR));
            labelled = true;
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 20))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn series(values: Vec<f64>) -> PowerSeries {
        let start = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        PowerSeries::new(timestamps, values).unwrap()
    }

    const CANVAS: (u32, u32) = (640, 360);

    fn draw_to_buffer(series: &PowerSeries, label: &str) -> Vec<u8> {
        let mut buffer = vec![0u8; (CANVAS.0 * CANVAS.1 * 3) as usize];
        {
            let backend = BitMapBackend::with_buffer(&mut buffer, CANVAS);
            let root = FontSafeBackend::new(backend).into_drawing_area();
            draw_power_chart(root, series, label).unwrap();
        }
        buffer
    }

    fn is_dark(px: &[u8]) -> bool {
        px.iter().all(|&c| c < 96)
    }

    fn ramp() -> PowerSeries {
        series((0..24).map(|i| f64::from(i) * 100_000.0).collect())
    }

    #[test]
    fn legend_shows_the_label() {
        let a = draw_to_buffer(&ramp(), "E-101/3050");
        let b = draw_to_buffer(&ramp(), "V112/3000");

        let differing: Vec<(u32, u32)> = a
            .chunks(3)
            .zip(b.chunks(3))
            .enumerate()
            .filter(|(_, (pa, pb))| pa != pb)
            .map(|(i, _)| (i as u32 % CANVAS.0, i as u32 / CANVAS.0))
            .collect();
        assert!(!differing.is_empty());
        // Only the legend in the upper right corner depends on the label.
        for &(x, y) in &differing {
            assert!(x > CANVAS.0 / 2 && y < CANVAS.1 / 2, "({x}, {y})");
        }
        let dark_in_legend = a
            .chunks(3)
            .enumerate()
            .filter(|(i, px)| {
                let (x, y) = (*i as u32 % CANVAS.0, *i as u32 / CANVAS.0);
                x > CANVAS.0 / 2 && y < CANVAS.1 / 2 && is_dark(px)
            })
            .count();
        assert!(dark_in_legend > 0);
    }

    #[test]
    fn axis_description_is_drawn() {
        let buffer = draw_to_buffer(&ramp(), "E-101/3050");
        // The rotated y axis description sits alone at the left edge of the label area.
        let dark_left_strip = buffer
            .chunks(3)
            .enumerate()
            .filter(|(i, px)| (*i as u32 % CANVAS.0) < 45 && is_dark(px))
            .count();
        assert!(dark_left_strip > 0);
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn writes_chart_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("static").join("turbine_output.png");
        let renderer = ChartRenderer::new(&path, (640, 360));

        let values = (0..24).map(|i| f64::from(i) * 100_000.0).collect();
        let written = renderer.render(&series(values), "E-101/3050").await.unwrap();

        assert_eq!(written, path);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        assert_eq!(entries(path.parent().unwrap()), vec!["turbine_output.png"]);
    }

    #[tokio::test]
    async fn overwrites_the_previous_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        std::fs::write(&path, b"stale").unwrap();

        let renderer = ChartRenderer::new(&path, (320, 200));
        renderer
            .render(&series(vec![0.0, f64::NAN, 5.0, 7.0]), "gaps")
            .await
            .unwrap();

        assert_ne!(std::fs::read(&path).unwrap(), b"stale");
        assert_eq!(entries(dir.path()), vec!["chart.png"]);
    }

    #[tokio::test]
    async fn empty_series_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let err = ChartRenderer::new(&path, (320, 200))
            .render(&series(vec![]), "none")
            .await
            .unwrap_err();
        assert!(matches!(err, ChartError::EmptySeries));
        assert!(!path.exists());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ChartRenderer::new(dir.path().join("chart.svg"), (320, 200));
        assert!(matches!(
            renderer.render_blocking(&series(vec![1.0]), "x"),
            Err(ChartError::UnsupportedFormat(_))
        ));
    }
}
