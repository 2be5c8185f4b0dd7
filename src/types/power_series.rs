use crate::types::weather_frame::DATETIME_COLUMN;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;

/// Name of the value column produced by [`PowerSeries::to_frame`].
pub const POWER_OUTPUT_COLUMN: &str = "power_output";

/// Electrical power output (W) per timestamp, aligned with the weather it was computed from.
///
/// Missing inputs show up as `NaN`; the statistics below ignore those entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl PowerSeries {
    /// Pairs timestamps with values. Both must have the same length.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Option<Self> {
        (timestamps.len() == values.len()).then_some(Self { timestamps, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    fn finite(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied().filter(|v| v.is_finite())
    }

    /// Largest finite value.
    pub fn max(&self) -> Option<f64> {
        self.finite().reduce(f64::max)
    }

    /// Mean of the finite values.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self.finite().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// Energy in Wh, holding every value until the next timestamp.
    ///
    /// The last value is held for the interval before it; a single value for one hour.
    pub fn energy_wh(&self) -> f64 {
        let hours: Vec<f64> = self
            .timestamps
            .windows(2)
            .map(|w| (w[1] - w[0]).num_milliseconds() as f64 / 3_600_000.0)
            .collect();
        let last = hours.last().copied().unwrap_or(1.0);

        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, v)| v * hours.get(i).copied().unwrap_or(last))
            .sum()
    }

    /// Mean output relative to `nominal_power` (W).
    pub fn capacity_factor(&self, nominal_power: f64) -> Option<f64> {
        if nominal_power <= 0.0 {
            return None;
        }
        self.mean().map(|m| m / nominal_power)
    }

    /// A two-column frame: `datetime` and `power_output`.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let millis: Vec<i64> = self.timestamps.iter().map(|t| t.timestamp_millis()).collect();
        let datetime = Series::new(DATETIME_COLUMN.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        let values = Series::new(POWER_OUTPUT_COLUMN.into(), self.values.clone());
        DataFrame::new(vec![datetime.into_column(), values.into_column()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn series(values: Vec<f64>) -> PowerSeries {
        let start = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..values.len())
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        PowerSeries::new(timestamps, values).unwrap()
    }

    #[test]
    fn stats_skip_nan() {
        let s = series(vec![1000.0, f64::NAN, 3000.0]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.max(), Some(3000.0));
        assert_eq!(s.mean(), Some(2000.0));
        assert_eq!(s.energy_wh(), 4000.0);
        assert_eq!(s.capacity_factor(4000.0), Some(0.5));
        assert_eq!(s.capacity_factor(0.0), None);
    }

    #[test]
    fn single_value_counts_one_hour() {
        assert_eq!(series(vec![500.0]).energy_wh(), 500.0);
        assert_eq!(series(vec![]).energy_wh(), 0.0);
        assert_eq!(series(vec![]).mean(), None);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(PowerSeries::new(vec![Utc::now()], vec![]).is_none());
    }

    #[test]
    fn frame_has_two_columns() {
        let frame = series(vec![1.0, 2.0]).to_frame().unwrap();
        assert_eq!(frame.shape(), (2, 2));
        assert_eq!(
            frame
                .column(POWER_OUTPUT_COLUMN)
                .unwrap()
                .as_materialized_series()
                .f64()
                .unwrap()
                .get(1),
            Some(2.0)
        );
    }
}
