use crate::types::weather_frame::WeatherFrame;
use crate::types::weather_variable::{ColumnKey, WeatherVariable};
use crate::utils::parse_utc_timestamp;
use crate::weather_data::error::WeatherDataError;
use chrono::{DateTime, Utc};
use log::{debug, info};
use polars::frame::DataFrame;
use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::task;

/// Number of header rows: variable names, then measurement heights.
const HEADER_ROWS: usize = 2;

/// Reads weather CSV files into [`WeatherFrame`]s.
///
/// The expected layout is a comma-separated table whose first row holds variable names
/// and whose second row holds the measurement height of each column, in meters:
///
/// ```text
/// variable_name,pressure,temperature,wind_speed,temperature,wind_speed
/// height,0,2,10,10,80
/// 2010-01-01 00:00:00+01:00,98405.7,267.6,5.32697,267.57,7.80697
/// ```
///
/// The first column holds the timestamps. Nothing is cached: every call re-reads the file.
pub struct WeatherDataLoader {
    path: PathBuf,
}

impl WeatherDataLoader {
    pub fn new(path: &Path) -> WeatherDataLoader {
        WeatherDataLoader {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the weather file on a blocking task.
    pub async fn load(&self) -> Result<WeatherFrame, WeatherDataError> {
        let path = self.path.clone();
        task::spawn_blocking(move || read_weather_csv(&path)).await?
    }
}

/// Parses a weather file with a two-row `(variable, height)` header.
pub fn read_weather_csv(path: &Path) -> Result<WeatherFrame, WeatherDataError> {
    if !path.is_file() {
        return Err(WeatherDataError::FileNotFound(path.to_path_buf()));
    }

    // Every cell is read as a string; the header rows make type inference meaningless.
    let raw = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| WeatherDataError::CsvRead {
            path: path.to_path_buf(),
            source: e,
        })?
        .finish()
        .map_err(|e| WeatherDataError::CsvRead {
            path: path.to_path_buf(),
            source: e,
        })?;

    let frame = raw_to_weather_frame(&raw, path)?;
    info!(
        "Loaded {} weather rows with {} columns from {}",
        frame.len(),
        frame.keys().len(),
        path.display()
    );
    Ok(frame)
}

fn raw_to_weather_frame(raw: &DataFrame, path: &Path) -> Result<WeatherFrame, WeatherDataError> {
    let malformed = |message: String| WeatherDataError::MalformedHeader {
        path: path.to_path_buf(),
        message,
    };

    if raw.width() < 2 {
        return Err(malformed(format!(
            "expected a timestamp column and at least one value column, found {} column(s)",
            raw.width()
        )));
    }
    if raw.height() < HEADER_ROWS {
        return Err(malformed(
            "expected two header rows (variable names, heights)".to_string(),
        ));
    }
    if raw.height() == HEADER_ROWS {
        return Err(WeatherDataError::Empty(path.to_path_buf()));
    }

    let cells: Vec<&StringChunked> = raw
        .get_columns()
        .iter()
        .map(|c| c.as_materialized_series().str())
        .collect::<PolarsResult<Vec<_>>>()?;

    let timestamps = parse_time_index(cells[0])?;

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(cells.len() - 1);
    for (index, column) in cells.iter().copied().enumerate().skip(1) {
        let variable = column
            .get(0)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| malformed(format!("column {} has no variable name", index + 1)))?;
        let height_cell = column
            .get(1)
            .map(str::trim)
            .ok_or_else(|| malformed(format!("column '{variable}' has no height")))?;
        let height = parse_height(variable, height_cell)?;

        let key = ColumnKey::new(WeatherVariable::from(variable), height);
        if !seen.insert(key.clone()) {
            return Err(malformed(format!("duplicate column '{key}'")));
        }

        let values = column
            .into_iter()
            .skip(HEADER_ROWS)
            .enumerate()
            .map(|(row, cell)| parse_value(&key, row, cell))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Parsed column {} ({} values)", key, values.len());
        columns.push((key, values));
    }

    WeatherFrame::from_columns(&timestamps, columns)
}

fn parse_time_index(column: &StringChunked) -> Result<Vec<DateTime<Utc>>, WeatherDataError> {
    let mut timestamps: Vec<DateTime<Utc>> = Vec::with_capacity(column.len());
    for (row, cell) in column.into_iter().skip(HEADER_ROWS).enumerate() {
        let cell = cell.unwrap_or_default();
        let timestamp =
            parse_utc_timestamp(cell).ok_or_else(|| WeatherDataError::InvalidTimestamp {
                row,
                value: cell.to_string(),
            })?;
        if timestamps.last().is_some_and(|previous| *previous >= timestamp) {
            return Err(WeatherDataError::NonMonotonicTimestamps {
                row,
                timestamp: timestamp.to_rfc3339(),
            });
        }
        timestamps.push(timestamp);
    }
    Ok(timestamps)
}

fn parse_height(variable: &str, cell: &str) -> Result<u32, WeatherDataError> {
    let invalid = || WeatherDataError::InvalidHeight {
        variable: variable.to_string(),
        value: cell.to_string(),
    };
    let height: f64 = cell.parse().map_err(|_| invalid())?;
    if !height.is_finite() || height < 0.0 || height.fract() != 0.0 || height > u32::MAX as f64 {
        return Err(invalid());
    }
    Ok(height as u32)
}

fn parse_value(
    key: &ColumnKey,
    row: usize,
    cell: Option<&str>,
) -> Result<Option<f64>, WeatherDataError> {
    let Some(cell) = cell.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    cell.parse::<f64>()
        .map(Some)
        .map_err(|_| WeatherDataError::InvalidNumber {
            column: key.to_string(),
            row,
            value: cell.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const SAMPLE: &str = "\
variable_name,pressure,temperature,wind_speed,roughness_length,temperature,wind_speed
height,0,2,10,0,10,80
2010-01-01 00:00:00+01:00,98405.7,267.6,5.32697,0.15,267.57,7.80697
2010-01-01 01:00:00+01:00,98382.7,267.6,5.46199,0.15,267.55,7.86199
2010-01-01 02:00:00+01:00,98362.9,267.61,5.67899,0.15,267.54,8.59899
";

    #[test]
    fn parses_two_level_header() {
        let file = write_csv(SAMPLE);
        let frame = read_weather_csv(file.path()).unwrap();

        assert_eq!(frame.len(), 3);
        assert_eq!(frame.keys().len(), 6);
        assert_eq!(frame.heights(&WeatherVariable::WindSpeed), vec![10, 80]);
        assert_eq!(frame.heights(&WeatherVariable::Temperature), vec![2, 10]);
        assert_eq!(frame.heights(&WeatherVariable::Pressure), vec![0]);

        let wind = frame
            .values(&ColumnKey::new(WeatherVariable::WindSpeed, 80))
            .unwrap();
        assert_eq!(wind, vec![7.80697, 7.86199, 8.59899]);

        let first = frame.timestamps().unwrap()[0];
        assert_eq!(first, Utc.with_ymd_and_hms(2009, 12, 31, 23, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn loader_reads_on_a_blocking_task() {
        let file = write_csv(SAMPLE);
        let loader = WeatherDataLoader::new(file.path());
        let frame = loader.load().await.unwrap();
        assert_eq!(frame.len(), 3);
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let err = read_weather_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, WeatherDataError::FileNotFound(_)));
    }

    #[test]
    fn header_only_file_is_empty() {
        let file = write_csv("variable_name,wind_speed\nheight,10\n");
        let err = read_weather_csv(file.path()).unwrap_err();
        assert!(matches!(err, WeatherDataError::Empty(_)));
    }

    #[test]
    fn non_numeric_height_is_rejected() {
        let file = write_csv("variable_name,wind_speed\nheight,ten\n2010-01-01 00:00:00,5.0\n");
        let err = read_weather_csv(file.path()).unwrap_err();
        assert!(matches!(err, WeatherDataError::InvalidHeight { .. }));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let file = write_csv(
            "variable_name,wind_speed,wind_speed\nheight,10,10.0\n2010-01-01 00:00:00,5.0,5.1\n",
        );
        let err = read_weather_csv(file.path()).unwrap_err();
        assert!(matches!(err, WeatherDataError::MalformedHeader { .. }));
    }

    #[test]
    fn unordered_timestamps_are_rejected() {
        let file = write_csv(
            "variable_name,wind_speed\nheight,10\n2010-01-01 01:00:00,5.0\n2010-01-01 00:00:00,5.1\n",
        );
        let err = read_weather_csv(file.path()).unwrap_err();
        assert!(matches!(
            err,
            WeatherDataError::NonMonotonicTimestamps { row: 1, .. }
        ));
    }

    #[test]
    fn bad_numbers_and_timestamps_are_reported() {
        let file = write_csv("variable_name,wind_speed\nheight,10\n2010-01-01 00:00:00,fast\n");
        assert!(matches!(
            read_weather_csv(file.path()).unwrap_err(),
            WeatherDataError::InvalidNumber { row: 0, .. }
        ));

        let file = write_csv("variable_name,wind_speed\nheight,10\nnoon,5.0\n");
        assert!(matches!(
            read_weather_csv(file.path()).unwrap_err(),
            WeatherDataError::InvalidTimestamp { row: 0, .. }
        ));
    }

    #[test]
    fn empty_cells_are_missing_values() {
        let file = write_csv(
            "variable_name,wind_speed,pressure\nheight,10,0\n2010-01-01 00:00:00,,101325\n2010-01-01 01:00:00,4.0,101300\n",
        );
        let frame = read_weather_csv(file.path()).unwrap();
        let wind = frame
            .values(&ColumnKey::new(WeatherVariable::WindSpeed, 10))
            .unwrap();
        assert!(wind[0].is_nan());
        assert_eq!(wind[1], 4.0);
    }
}
