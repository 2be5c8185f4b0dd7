//! Two-level column keys of a weather series: a variable name and the height (in meters)
//! it was measured at.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between variable name and height in the frame's column names.
const KEY_SEPARATOR: char = '@';

/// A meteorological variable as it appears in the first header row of a weather file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherVariable {
    /// Wind speed in m/s.
    WindSpeed,
    /// Air temperature in K.
    Temperature,
    /// Air pressure in Pa.
    Pressure,
    /// Surface roughness length in m.
    RoughnessLength,
    /// Air density in kg/m³.
    Density,
    /// Any other column. Carried along but never read by the model chain.
    Other(String),
}

impl WeatherVariable {
    pub fn as_str(&self) -> &str {
        match self {
            WeatherVariable::WindSpeed => "wind_speed",
            WeatherVariable::Temperature => "temperature",
            WeatherVariable::Pressure => "pressure",
            WeatherVariable::RoughnessLength => "roughness_length",
            WeatherVariable::Density => "density",
            WeatherVariable::Other(name) => name,
        }
    }
}

impl From<&str> for WeatherVariable {
    fn from(name: &str) -> Self {
        match name.trim() {
            "wind_speed" => WeatherVariable::WindSpeed,
            "temperature" => WeatherVariable::Temperature,
            "pressure" => WeatherVariable::Pressure,
            "roughness_length" => WeatherVariable::RoughnessLength,
            "density" => WeatherVariable::Density,
            other => WeatherVariable::Other(other.to_string()),
        }
    }
}

impl fmt::Display for WeatherVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `(variable, height)` key of one weather column.
///
/// Rendered as `"<variable>@<height>"` when used as a polars column name,
/// e.g. `wind_speed@10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnKey {
    pub variable: WeatherVariable,
    /// Measurement height in meters.
    pub height: u32,
}

impl ColumnKey {
    pub fn new(variable: WeatherVariable, height: u32) -> Self {
        Self { variable, height }
    }

    /// The key the enricher writes: `(roughness_length, 0)`.
    pub fn roughness() -> Self {
        Self::new(WeatherVariable::RoughnessLength, 0)
    }

    pub fn column_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.variable, KEY_SEPARATOR, self.height)
    }
}

impl FromStr for ColumnKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (variable, height) = s
            .rsplit_once(KEY_SEPARATOR)
            .ok_or_else(|| format!("column '{s}' is not a '<variable>@<height>' key"))?;
        let height = height
            .parse::<u32>()
            .map_err(|e| format!("column '{s}' has an invalid height: {e}"))?;
        Ok(ColumnKey::new(WeatherVariable::from(variable), height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_parse_back_to_keys() {
        let key = ColumnKey::new(WeatherVariable::WindSpeed, 80);
        assert_eq!(key.column_name(), "wind_speed@80");
        assert_eq!("wind_speed@80".parse::<ColumnKey>().unwrap(), key);
    }

    #[test]
    fn unknown_variables_are_kept_verbatim() {
        let key: ColumnKey = "humidity@2".parse().unwrap();
        assert_eq!(
            key.variable,
            WeatherVariable::Other("humidity".to_string())
        );
        assert_eq!(key.height, 2);
    }

    #[test]
    fn rejects_names_without_height() {
        assert!("datetime".parse::<ColumnKey>().is_err());
        assert!("wind_speed@ten".parse::<ColumnKey>().is_err());
    }
}
