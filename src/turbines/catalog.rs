use crate::turbines::error::TurbineError;
use crate::turbines::oedb::read_oedb_library;
use crate::types::turbine::{PowerCurve, TurbineSpec};
use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::task;

const BUNDLED_LIBRARY: &str = include_str!("../../data/turbine_library.json");
const KILOWATT: f64 = 1000.0;

/// Raw library record; powers are in kW.
#[derive(Debug, Deserialize)]
pub(crate) struct LibraryEntry {
    pub(crate) turbine_type: String,
    pub(crate) manufacturer: String,
    pub(crate) nominal_power: f64,
    #[serde(default)]
    pub(crate) rotor_diameter: Option<f64>,
    #[serde(default)]
    pub(crate) hub_heights: Vec<f64>,
    pub(crate) power_curve_wind_speeds: Vec<f64>,
    pub(crate) power_curve_values: Vec<f64>,
}

impl TryFrom<LibraryEntry> for TurbineSpec {
    type Error = TurbineError;

    fn try_from(entry: LibraryEntry) -> Result<Self, Self::Error> {
        let values = entry
            .power_curve_values
            .iter()
            .map(|kw| kw * KILOWATT)
            .collect();
        let power_curve =
            PowerCurve::new(&entry.turbine_type, entry.power_curve_wind_speeds, values)?;
        Ok(TurbineSpec {
            turbine_type: entry.turbine_type,
            manufacturer: entry.manufacturer,
            nominal_power: entry.nominal_power * KILOWATT,
            rotor_diameter: entry.rotor_diameter,
            hub_heights: entry.hub_heights,
            power_curve,
        })
    }
}

/// The turbine types known to the estimator.
#[derive(Debug, Clone)]
pub struct TurbineCatalog {
    turbines: Vec<TurbineSpec>,
}

impl TurbineCatalog {
    /// The library compiled into the crate.
    pub fn bundled() -> Result<Self, TurbineError> {
        Self::from_json(BUNDLED_LIBRARY)
    }

    /// Parses a library in the bundled layout (a JSON array, powers in kW).
    pub fn from_json(json: &str) -> Result<Self, TurbineError> {
        let entries: Vec<LibraryEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Reads a library from disk: a JSON file in the bundled layout, or a directory (or
    /// one of its two files) holding windpowerlib's oedb cache, see [`crate::turbines::oedb`].
    pub fn from_path(path: &Path) -> Result<Self, TurbineError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let catalog = match extension.as_deref() {
            _ if path.is_dir() => Self::from_entries(read_oedb_library(path)?)?,
            Some("json") => {
                let json = std::fs::read_to_string(path)
                    .map_err(|e| TurbineError::LibraryIo(path.to_path_buf(), e))?;
                Self::from_json(&json)?
            }
            Some("csv") => {
                let dir = match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                Self::from_entries(read_oedb_library(&dir)?)?
            }
            _ => return Err(TurbineError::UnsupportedLibrary(path.to_path_buf())),
        };
        info!(
            "Loaded {} turbine types from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// [`TurbineCatalog::from_path`] on a blocking task.
    pub async fn load(path: &Path) -> Result<Self, TurbineError> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || Self::from_path(&path)).await?
    }

    fn from_entries(entries: Vec<LibraryEntry>) -> Result<Self, TurbineError> {
        let turbines = entries
            .into_iter()
            .map(TurbineSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Turbine catalog holds {} types", turbines.len());
        Ok(Self { turbines })
    }

    pub fn len(&self) -> usize {
        self.turbines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turbines.is_empty()
    }

    /// Identifiers of every turbine type, in library order.
    pub fn turbine_types(&self) -> Vec<&str> {
        self.turbines
            .iter()
            .map(|t| t.turbine_type.as_str())
            .collect()
    }

    /// Finds a turbine by its full identifier (`"E-101/3050"`), or by model name alone
    /// (`"E-101"`) when that is unambiguous. Matching ignores case and surrounding spaces.
    pub fn lookup(&self, turbine_type: &str) -> Result<&TurbineSpec, TurbineError> {
        let query = turbine_type.trim();

        if let Some(spec) = self
            .turbines
            .iter()
            .find(|t| t.turbine_type.eq_ignore_ascii_case(query))
        {
            return Ok(spec);
        }

        let candidates: Vec<&TurbineSpec> = self
            .turbines
            .iter()
            .filter(|t| {
                t.turbine_type
                    .split_once('/')
                    .is_some_and(|(model, _)| model.eq_ignore_ascii_case(query))
            })
            .collect();

        match candidates.as_slice() {
            [spec] => Ok(spec),
            [] => Err(TurbineError::UnknownType(query.to_string())),
            many => Err(TurbineError::AmbiguousType {
                query: query.to_string(),
                candidates: many.iter().map(|t| t.turbine_type.clone()).collect(),
            }),
        }
    }
}
