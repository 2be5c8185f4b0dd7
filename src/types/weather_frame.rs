// weather_frame.rs

//! Contains the `WeatherFrame` structure: a time-indexed weather series with two-level
//! `(variable, height)` columns, backed by a Polars `DataFrame`.

use crate::types::weather_variable::{ColumnKey, WeatherVariable};
use crate::weather_data::enricher::enrich_with_roughness;
use crate::weather_data::error::WeatherDataError;
use chrono::{DateTime, TimeZone, Utc};
use polars::prelude::*;

/// Name of the time index column.
pub const DATETIME_COLUMN: &str = "datetime";

/// A wrapper around a Polars `DataFrame` holding a weather time series.
///
/// Every row is one timestamp. The `datetime` column holds the timestamps as
/// timezone-naive UTC at millisecond precision; every other column is a `Float64`
/// column named after its [`ColumnKey`] (`"wind_speed@10"`, `"pressure@0"`, ...).
///
/// Instances are typically obtained via [`crate::WeatherDataLoader::load`].
///
/// # Note on Datetimes
///
/// Polars keeps the index timezone-naive. The accessors here convert to and from
/// `DateTime<Utc>`, so callers only ever see timezone-aware instants.
#[derive(Debug, Clone)]
pub struct WeatherFrame {
    /// The underlying Polars DataFrame.
    pub frame: DataFrame,
}

impl WeatherFrame {
    /// Wraps an existing frame. The frame is assumed to follow the layout described above.
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Builds a frame from timestamps and keyed value columns.
    ///
    /// Every column must have one value per timestamp; `None` marks a missing value.
    pub fn from_columns(
        timestamps: &[DateTime<Utc>],
        columns: Vec<(ColumnKey, Vec<Option<f64>>)>,
    ) -> Result<Self, WeatherDataError> {
        let millis: Vec<i64> = timestamps.iter().map(|t| t.timestamp_millis()).collect();
        let datetime = Series::new(DATETIME_COLUMN.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

        let mut frame_columns = Vec::with_capacity(columns.len() + 1);
        frame_columns.push(datetime.into_column());
        for (key, values) in columns {
            frame_columns.push(Series::new(key.column_name().into(), values).into_column());
        }

        Ok(Self::new(DataFrame::new(frame_columns)?))
    }

    /// Number of timestamps (rows).
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// The time index as UTC instants, in row order.
    pub fn timestamps(&self) -> Result<Vec<DateTime<Utc>>, WeatherDataError> {
        let column = self
            .frame
            .column(DATETIME_COLUMN)
            .map_err(|_| WeatherDataError::ColumnNotFound(DATETIME_COLUMN.to_string()))?;
        let millis = column.as_materialized_series().cast(&DataType::Int64)?;

        millis
            .i64()?
            .into_iter()
            .enumerate()
            .map(|(row, ms)| {
                ms.and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                    .ok_or_else(|| WeatherDataError::InvalidTimestamp {
                        row,
                        value: format!("{ms:?}"),
                    })
            })
            .collect()
    }

    /// All `(variable, height)` keys in column order.
    pub fn keys(&self) -> Vec<ColumnKey> {
        self.frame
            .get_columns()
            .iter()
            .filter_map(|c| c.name().as_str().parse::<ColumnKey>().ok())
            .collect()
    }

    /// The measurement heights available for `variable`, in column order.
    pub fn heights(&self, variable: &WeatherVariable) -> Vec<u32> {
        self.keys()
            .into_iter()
            .filter(|k| &k.variable == variable)
            .map(|k| k.height)
            .collect()
    }

    pub fn contains(&self, key: &ColumnKey) -> bool {
        self.frame.column(&key.column_name()).is_ok()
    }

    /// Values of one column; missing values become `NaN`.
    pub fn values(&self, key: &ColumnKey) -> Result<Vec<f64>, WeatherDataError> {
        let name = key.column_name();
        let column = self
            .frame
            .column(&name)
            .map_err(|_| WeatherDataError::ColumnNotFound(name.clone()))?;
        let series = column.as_materialized_series().cast(&DataType::Float64)?;
        Ok(series
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    /// Returns a copy with a `(roughness_length, 0)` column holding `roughness` on every row.
    ///
    /// See [`enrich_with_roughness`].
    pub fn with_roughness(&self, roughness: f64) -> Result<WeatherFrame, WeatherDataError> {
        enrich_with_roughness(self, roughness)
    }

    /// Restricts the series to records within `[start, end]` (inclusive).
    ///
    /// The filter runs lazily on the underlying frame; row order is preserved.
    pub fn filter_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<WeatherFrame, WeatherDataError> {
        let start_naive = start.naive_utc();
        let end_naive = end.naive_utc();

        let frame = self
            .frame
            .clone()
            .lazy()
            .filter(
                col(DATETIME_COLUMN)
                    .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
                    .gt_eq(lit(start_naive))
                    .and(
                        col(DATETIME_COLUMN)
                            .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
                            .lt_eq(lit(end_naive)),
                    ),
            )
            .collect()?;
        Ok(WeatherFrame::new(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn hourly(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::hours(i as i64)).collect()
    }

    fn sample_frame() -> WeatherFrame {
        let timestamps = hourly(4);
        WeatherFrame::from_columns(
            &timestamps,
            vec![
                (
                    ColumnKey::new(WeatherVariable::WindSpeed, 10),
                    vec![Some(3.0), Some(4.0), None, Some(6.0)],
                ),
                (
                    ColumnKey::new(WeatherVariable::WindSpeed, 80),
                    vec![Some(5.0), Some(6.0), Some(7.0), Some(8.0)],
                ),
                (
                    ColumnKey::new(WeatherVariable::Pressure, 0),
                    vec![Some(101_325.0); 4],
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn timestamps_survive_the_frame() {
        let frame = sample_frame();
        assert_eq!(frame.len(), 4);
        assert_eq!(frame.timestamps().unwrap(), hourly(4));
    }

    #[test]
    fn keys_and_heights_follow_column_order() {
        let frame = sample_frame();
        assert_eq!(frame.keys().len(), 3);
        assert_eq!(frame.heights(&WeatherVariable::WindSpeed), vec![10, 80]);
        assert_eq!(frame.heights(&WeatherVariable::Pressure), vec![0]);
        assert!(frame.heights(&WeatherVariable::Temperature).is_empty());
    }

    #[test]
    fn missing_values_read_as_nan() {
        let frame = sample_frame();
        let values = frame
            .values(&ColumnKey::new(WeatherVariable::WindSpeed, 10))
            .unwrap();
        assert_eq!(values[0], 3.0);
        assert!(values[2].is_nan());
    }

    #[test]
    fn unknown_column_is_reported() {
        let frame = sample_frame();
        let err = frame
            .values(&ColumnKey::new(WeatherVariable::Temperature, 2))
            .unwrap_err();
        assert!(matches!(err, WeatherDataError::ColumnNotFound(name) if name == "temperature@2"));
    }

    #[test]
    fn filter_range_is_inclusive() {
        let frame = sample_frame();
        let ts = hourly(4);
        let filtered = frame.filter_range(ts[1], ts[2]).unwrap();
        assert_eq!(filtered.timestamps().unwrap(), vec![ts[1], ts[2]]);
        assert_eq!(filtered.keys(), frame.keys());
    }
}
