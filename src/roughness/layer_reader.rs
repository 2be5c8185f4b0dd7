use crate::roughness::crs::LayerCrs;
use crate::roughness::error::RoughnessError;
use crate::types::land_cover::LandCoverPolygon;
use geo::{Geometry, MultiPolygon};
use geojson::{Feature, GeoJson};
use log::{info, warn};
use serde_json::Value as JsonValue;
use shapefile::dbase::{FieldValue, Record};
use shapefile::Shape;
use std::path::Path;

/// Name of the attribute holding the roughness length.
pub const ROUGHNESS_ATTRIBUTE: &str = "roughness";

/// A land-cover layer as read from disk.
#[derive(Debug, Clone)]
pub struct LandCoverLayer {
    pub crs: LayerCrs,
    pub polygons: Vec<LandCoverPolygon>,
}

/// Reads a polygon layer with a `roughness` attribute.
///
/// Shapefiles take their CRS from the `.prj` sidecar (EPSG:4326 when it is missing);
/// GeoJSON is EPSG:4326 by definition. `crs_override` (an `EPSG:` code) wins over both.
pub fn read_land_cover(
    path: &Path,
    crs_override: Option<&str>,
) -> Result<LandCoverLayer, RoughnessError> {
    if !path.is_file() {
        return Err(RoughnessError::LayerNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let (file_crs, polygons) = match extension.as_deref() {
        Some("shp") => (read_prj(path)?, read_shapefile(path)?),
        Some("geojson") | Some("json") => (LayerCrs::Geographic, read_geojson(path)?),
        _ => return Err(RoughnessError::UnsupportedFormat(path.to_path_buf())),
    };

    let crs = match crs_override {
        Some(code) => LayerCrs::from_epsg(code)?,
        None => file_crs,
    };

    if polygons.is_empty() {
        return Err(RoughnessError::EmptyLayer(path.to_path_buf()));
    }
    info!(
        "Loaded {} land-cover polygons ({}) from {}",
        polygons.len(),
        crs,
        path.display()
    );
    Ok(LandCoverLayer { crs, polygons })
}

fn read_prj(shp_path: &Path) -> Result<LayerCrs, RoughnessError> {
    let prj_path = shp_path.with_extension("prj");
    if !prj_path.is_file() {
        warn!(
            "No .prj next to {}, assuming EPSG:4326 coordinates",
            shp_path.display()
        );
        return Ok(LayerCrs::Geographic);
    }
    let wkt = std::fs::read_to_string(&prj_path)
        .map_err(|e| RoughnessError::LayerIo(prj_path.clone(), e))?;
    LayerCrs::from_wkt(&wkt)
}

fn read_shapefile(path: &Path) -> Result<Vec<LandCoverPolygon>, RoughnessError> {
    let mut reader = shapefile::Reader::from_path(path)
        .map_err(|e| RoughnessError::ShapefileRead(path.to_path_buf(), e))?;

    let mut polygons = Vec::new();
    for (record_index, item) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) =
            item.map_err(|e| RoughnessError::ShapefileRead(path.to_path_buf(), e))?;
        let geometry: MultiPolygon<f64> = match shape {
            Shape::Polygon(polygon) => polygon.into(),
            Shape::PolygonM(polygon) => polygon.into(),
            Shape::PolygonZ(polygon) => polygon.into(),
            other => {
                warn!(
                    "Skipping record {} of {}: {:?} is not a polygon",
                    record_index,
                    path.display(),
                    other.shapetype()
                );
                continue;
            }
        };
        let roughness = shapefile_roughness(&record, record_index)?;
        polygons.extend(LandCoverPolygon::new(record_index, geometry, roughness));
    }
    Ok(polygons)
}

fn shapefile_roughness(record: &Record, record_index: usize) -> Result<f64, RoughnessError> {
    let field = record
        .get(ROUGHNESS_ATTRIBUTE)
        .or_else(|| record.get("ROUGHNESS"))
        .or_else(|| record.get("Roughness"))
        .ok_or(RoughnessError::MissingRoughness {
            record: record_index,
        })?;

    let value = match field {
        FieldValue::Numeric(Some(v)) => Some(*v),
        FieldValue::Double(v) => Some(*v),
        FieldValue::Float(Some(v)) => Some(f64::from(*v)),
        FieldValue::Integer(v) => Some(f64::from(*v)),
        FieldValue::Character(Some(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .ok_or_else(|| RoughnessError::InvalidRoughness {
            record: record_index,
            value: format!("{field:?}"),
        })
        .and_then(|v| validate_roughness(v, record_index))
}

fn read_geojson(path: &Path) -> Result<Vec<LandCoverPolygon>, RoughnessError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| RoughnessError::LayerIo(path.to_path_buf(), e))?;
    let geojson: GeoJson = text
        .parse()
        .map_err(|e| RoughnessError::GeoJsonParse(path.to_path_buf(), Box::new(e)))?;

    let features: Vec<Feature> = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        // A bare geometry has no attributes, hence no roughness.
        GeoJson::Geometry(_) => return Err(RoughnessError::MissingRoughness { record: 0 }),
    };

    let mut polygons = Vec::with_capacity(features.len());
    for (record_index, feature) in features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry.as_ref() else {
            warn!("Skipping feature {} of {}: no geometry", record_index, path.display());
            continue;
        };
        let geometry = Geometry::<f64>::try_from(geometry.value.clone())
            .map_err(|e| RoughnessError::GeoJsonParse(path.to_path_buf(), Box::new(e)))?;
        let geometry = match geometry {
            Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
            Geometry::MultiPolygon(multi) => multi,
            _ => {
                warn!(
                    "Skipping feature {} of {}: not a polygon",
                    record_index,
                    path.display()
                );
                continue;
            }
        };

        let roughness = feature
            .property(ROUGHNESS_ATTRIBUTE)
            .ok_or(RoughnessError::MissingRoughness {
                record: record_index,
            })
            .and_then(|value| json_roughness(value, record_index))?;
        polygons.extend(LandCoverPolygon::new(record_index, geometry, roughness));
    }
    Ok(polygons)
}

fn json_roughness(value: &JsonValue, record_index: usize) -> Result<f64, RoughnessError> {
    let parsed = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .ok_or_else(|| RoughnessError::InvalidRoughness {
            record: record_index,
            value: value.to_string(),
        })
        .and_then(|v| validate_roughness(v, record_index))
}

fn validate_roughness(value: f64, record_index: usize) -> Result<f64, RoughnessError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RoughnessError::InvalidRoughness {
            record: record_index,
            value: value.to_string(),
        })
    }
}
