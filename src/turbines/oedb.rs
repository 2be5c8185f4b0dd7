//! Reads the turbine library in the layout windpowerlib caches from the OpenEnergy
//! database: `oedb_turbine_data.csv` with one row per turbine type, next to
//! `oedb_power_curves.csv` holding a `wind_speed` column and one column of kW values per
//! turbine type (blank where a type has no value at that speed).

use crate::turbines::catalog::LibraryEntry;
use crate::turbines::error::TurbineError;
use log::{debug, warn};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const TURBINE_DATA_FILE: &str = "oedb_turbine_data.csv";
pub const POWER_CURVES_FILE: &str = "oedb_power_curves.csv";
const WIND_SPEED_COLUMN: &str = "wind_speed";

/// Entries of every turbine type in `dir` that has both a data row and a power curve.
pub(crate) fn read_oedb_library(dir: &Path) -> Result<Vec<LibraryEntry>, TurbineError> {
    let curves = read_power_curves(&dir.join(POWER_CURVES_FILE))?;
    let data_path = dir.join(TURBINE_DATA_FILE);
    let data = read_string_table(&data_path)?;

    let turbine_types = string_column(&data, &data_path, "turbine_type")?;
    let manufacturers = optional_string_column(&data, "manufacturer")?;
    let nominal_powers = string_column(&data, &data_path, "nominal_power")?;
    let rotor_diameters = optional_string_column(&data, "rotor_diameter")?;
    let hub_heights = optional_string_column(&data, "hub_height")?;

    let mut entries = Vec::new();
    for row in 0..data.height() {
        let Some(turbine_type) = turbine_types.get(row).map(str::trim).filter(|t| !t.is_empty())
        else {
            continue;
        };
        let Some((speeds, values)) = curves.get(turbine_type) else {
            debug!("Skipping {}: no power curve", turbine_type);
            continue;
        };
        let nominal_power = nominal_powers
            .get(row)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .ok_or_else(|| TurbineError::InvalidLibraryValue {
                path: data_path.clone(),
                column: "nominal_power".to_string(),
                value: nominal_powers.get(row).unwrap_or_default().to_string(),
            })?;

        entries.push(LibraryEntry {
            turbine_type: turbine_type.to_string(),
            manufacturer: manufacturers
                .and_then(|c| c.get(row))
                .unwrap_or_default()
                .trim()
                .to_string(),
            nominal_power,
            rotor_diameter: rotor_diameters
                .and_then(|c| c.get(row))
                .and_then(|v| v.trim().parse().ok()),
            hub_heights: hub_heights
                .and_then(|c| c.get(row))
                .map(parse_hub_heights)
                .unwrap_or_default(),
            power_curve_wind_speeds: speeds.clone(),
            power_curve_values: values.clone(),
        });
    }

    let orphans = curves.len().saturating_sub(entries.len());
    if orphans > 0 {
        warn!(
            "{} power curves in {} have no turbine data row and were skipped",
            orphans,
            dir.display()
        );
    }
    Ok(entries)
}

type Curve = (Vec<f64>, Vec<f64>);

fn read_power_curves(path: &Path) -> Result<HashMap<String, Curve>, TurbineError> {
    let table = read_string_table(path)?;
    let speeds = string_column(&table, path, WIND_SPEED_COLUMN)?
        .into_iter()
        .map(|cell| {
            let cell = cell.unwrap_or_default().trim();
            cell.parse::<f64>()
                .map_err(|_| TurbineError::InvalidLibraryValue {
                    path: path.to_path_buf(),
                    column: WIND_SPEED_COLUMN.to_string(),
                    value: cell.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut curves = HashMap::new();
    for column in table.get_columns() {
        let turbine_type = column.name().as_str();
        if turbine_type == WIND_SPEED_COLUMN {
            continue;
        }
        let mut curve: Curve = (Vec::new(), Vec::new());
        for (speed, cell) in speeds.iter().zip(column.as_materialized_series().str()?) {
            let Some(cell) = cell.map(str::trim).filter(|c| !c.is_empty()) else {
                continue;
            };
            let value = cell
                .parse::<f64>()
                .map_err(|_| TurbineError::InvalidLibraryValue {
                    path: path.to_path_buf(),
                    column: turbine_type.to_string(),
                    value: cell.to_string(),
                })?;
            curve.0.push(*speed);
            curve.1.push(value);
        }
        if !curve.0.is_empty() {
            curves.insert(turbine_type.to_string(), curve);
        }
    }
    Ok(curves)
}

/// Every cell as a string; the tables mix numbers, blanks and lists.
fn read_string_table(path: &Path) -> Result<DataFrame, TurbineError> {
    if !path.is_file() {
        return Err(TurbineError::LibraryIo(
            path.to_path_buf(),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
    }
    let csv_error = |source: PolarsError| TurbineError::LibraryCsv {
        path: path.to_path_buf(),
        source,
    };
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(csv_error)?
        .finish()
        .map_err(csv_error)
}

fn string_column<'a>(
    table: &'a DataFrame,
    path: &Path,
    name: &str,
) -> Result<&'a StringChunked, TurbineError> {
    optional_string_column(table, name)?.ok_or_else(|| TurbineError::MissingLibraryColumn {
        path: PathBuf::from(path),
        column: name.to_string(),
    })
}

fn optional_string_column<'a>(
    table: &'a DataFrame,
    name: &str,
) -> Result<Option<&'a StringChunked>, TurbineError> {
    match table.column(name) {
        Ok(column) => Ok(Some(column.as_materialized_series().str()?)),
        Err(_) => Ok(None),
    }
}

/// oedb lists the available hub heights in one cell, e.g. `"99;135;149"`.
fn parse_hub_heights(cell: &str) -> Vec<f64> {
    cell.split(|c: char| c == ';' || c == '/' || c == ',' || c.is_whitespace())
        .filter_map(|part| part.trim().parse::<f64>().ok())
        .filter(|h| h.is_finite() && *h > 0.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TURBINE_DATA: &str = "\
id,turbine_type,manufacturer,nominal_power,rotor_diameter,hub_height,has_power_curve
1,E-141/4200,Enercon,4200,141,129;159,True
2,GE130/3200,GE Wind,3200,130,110/134,True
3,NoCurve/1000,Nobody,1000,,,False
";

    const POWER_CURVES: &str = "\
wind_speed,E-141/4200,GE130/3200,Orphan/1
2.0,3.0,,0.0
3.0,37.0,20.0,1.0
4.0,400.0,150.0,
10.0,4200.0,3200.0,
";

    fn library_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TURBINE_DATA_FILE), TURBINE_DATA).unwrap();
        std::fs::write(dir.path().join(POWER_CURVES_FILE), POWER_CURVES).unwrap();
        dir
    }

    #[test]
    fn joins_turbine_rows_with_their_curves() {
        let dir = library_dir();
        let entries = read_oedb_library(dir.path()).unwrap();
        let types: Vec<&str> = entries.iter().map(|e| e.turbine_type.as_str()).collect();
        assert_eq!(types, vec!["E-141/4200", "GE130/3200"]);

        let ge = &entries[1];
        assert_eq!(ge.manufacturer, "GE Wind");
        assert_eq!(ge.nominal_power, 3200.0);
        assert_eq!(ge.rotor_diameter, Some(130.0));
        assert_eq!(ge.hub_heights, vec![110.0, 134.0]);
        // Blank cells are gaps in the curve, not zeros.
        assert_eq!(ge.power_curve_wind_speeds, vec![3.0, 4.0, 10.0]);
        assert_eq!(ge.power_curve_values, vec![20.0, 150.0, 3200.0]);
    }

    #[test]
    fn missing_files_and_columns_are_reported() {
        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_oedb_library(empty.path()),
            Err(TurbineError::LibraryIo(..))
        ));

        let dir = library_dir();
        std::fs::write(
            dir.path().join(TURBINE_DATA_FILE),
            "turbine_type,manufacturer\nE-141/4200,Enercon\n",
        )
        .unwrap();
        assert!(matches!(
            read_oedb_library(dir.path()),
            Err(TurbineError::MissingLibraryColumn { column, .. }) if column == "nominal_power"
        ));
    }

    #[test]
    fn hub_height_cells() {
        assert_eq!(parse_hub_heights("99;135; 149"), vec![99.0, 135.0, 149.0]);
        assert_eq!(parse_hub_heights("80/100"), vec![80.0, 100.0]);
        assert!(parse_hub_heights("").is_empty());
    }
}
