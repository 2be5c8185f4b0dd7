use crate::types::weather_frame::WeatherFrame;
use crate::types::weather_variable::ColumnKey;
use crate::weather_data::error::WeatherDataError;
use log::warn;
use polars::prelude::{IntoColumn, NamedFrom, Series};

/// Appends a `(roughness_length, 0)` column holding `roughness` on every row.
///
/// Rows, their order and the time index are untouched. A roughness column already present
/// in the input is replaced, so the output never carries two of them.
pub fn enrich_with_roughness(
    weather: &WeatherFrame,
    roughness: f64,
) -> Result<WeatherFrame, WeatherDataError> {
    if !roughness.is_finite() || roughness <= 0.0 {
        return Err(WeatherDataError::InvalidRoughness(roughness));
    }

    let key = ColumnKey::roughness();
    if weather.contains(&key) {
        warn!(
            "Weather data already has a '{}' column, replacing it with {} m",
            key, roughness
        );
    }

    let column = Series::new(key.column_name().into(), vec![roughness; weather.len()]);
    let mut frame = weather.frame.clone();
    frame.with_column(column.into_column())?;
    Ok(WeatherFrame::new(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::weather_variable::WeatherVariable;
    use chrono::{Duration, TimeZone, Utc};

    fn frame(rows: usize, with_roughness: bool) -> WeatherFrame {
        let start = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
        let timestamps: Vec<_> = (0..rows)
            .map(|i| start + Duration::hours(i as i64))
            .collect();
        let mut columns = vec![(
            ColumnKey::new(WeatherVariable::WindSpeed, 10),
            (0..rows).map(|i| Some(i as f64)).collect(),
        )];
        if with_roughness {
            columns.push((ColumnKey::roughness(), vec![Some(0.5); rows]));
        }
        WeatherFrame::from_columns(&timestamps, columns).unwrap()
    }

    #[test]
    fn adds_exactly_one_column_with_the_scalar() {
        let input = frame(24, false);
        let output = enrich_with_roughness(&input, 0.1).unwrap();

        assert_eq!(output.len(), input.len());
        assert_eq!(output.timestamps().unwrap(), input.timestamps().unwrap());
        assert_eq!(output.frame.width(), input.frame.width() + 1);
        let roughness = output.values(&ColumnKey::roughness()).unwrap();
        assert_eq!(roughness.len(), 24);
        assert!(roughness.iter().all(|&r| r == 0.1));
        // Existing columns are unchanged.
        let key = ColumnKey::new(WeatherVariable::WindSpeed, 10);
        assert_eq!(output.values(&key).unwrap(), input.values(&key).unwrap());
    }

    #[test]
    fn replaces_an_existing_roughness_column() {
        let input = frame(3, true);
        let output = input.with_roughness(0.03).unwrap();
        assert_eq!(output.frame.width(), input.frame.width());
        assert_eq!(
            output.values(&ColumnKey::roughness()).unwrap(),
            vec![0.03; 3]
        );
    }

    #[test]
    fn rejects_non_positive_roughness() {
        let input = frame(3, false);
        assert!(matches!(
            enrich_with_roughness(&input, 0.0),
            Err(WeatherDataError::InvalidRoughness(_))
        ));
        assert!(enrich_with_roughness(&input, f64::NAN).is_err());
    }
}
