//! Coordinate reference systems a land-cover layer may use, and projection of WGS 84
//! query points into them.

use crate::roughness::error::RoughnessError;
use std::f64::consts::PI;
use std::fmt;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;
const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// The reference system of a polygon layer.
///
/// Query points always arrive as EPSG:4326 longitude/latitude and are projected into the
/// layer's system before the spatial query, so both sides of the intersection agree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerCrs {
    /// Longitude/latitude in degrees (WGS 84, NAD83 and friends).
    Geographic,
    /// EPSG:3857 pseudo-Mercator, meters.
    WebMercator,
    /// Universal Transverse Mercator, meters.
    Utm { zone: u8, north: bool },
}

impl LayerCrs {
    /// Parses an `EPSG:<code>` identifier (the prefix is optional).
    pub fn from_epsg(code: &str) -> Result<Self, RoughnessError> {
        let unsupported = || RoughnessError::UnsupportedCrs(code.to_string());
        let trimmed = code.trim();
        let digits = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
            .unwrap_or(trimmed);
        let number: u32 = digits.parse().map_err(|_| unsupported())?;

        match number {
            4326 | 4269 | 4258 | 4283 => Ok(LayerCrs::Geographic),
            3857 | 900913 | 3785 => Ok(LayerCrs::WebMercator),
            // WGS 84 / UTM north and south, NAD83 / UTM north
            32601..=32660 => utm((number - 32600) as u8, true),
            32701..=32760 => utm((number - 32700) as u8, false),
            26901..=26923 => utm((number - 26900) as u8, true),
            _ => Err(unsupported()),
        }
    }

    /// Inspects the WKT of a shapefile `.prj`.
    pub fn from_wkt(wkt: &str) -> Result<Self, RoughnessError> {
        let upper = wkt.to_ascii_uppercase();
        if !upper.contains("PROJCS") && !upper.contains("PROJCRS") {
            if upper.contains("GEOGCS") || upper.contains("GEOGCRS") {
                return Ok(LayerCrs::Geographic);
            }
            return Err(RoughnessError::UnsupportedCrs(wkt.trim().to_string()));
        }

        if upper.contains("MERCATOR_AUXILIARY_SPHERE")
            || upper.contains("PSEUDO-MERCATOR")
            || upper.contains("PSEUDO_MERCATOR")
            || upper.contains("WEB_MERCATOR")
            || upper.contains("\"EPSG\",\"3857\"")
        {
            return Ok(LayerCrs::WebMercator);
        }

        if let Some((zone, north)) = parse_utm_zone(&upper) {
            return utm(zone, north);
        }

        Err(RoughnessError::UnsupportedCrs(wkt.trim().to_string()))
    }

    /// Projects a WGS 84 longitude/latitude (degrees) into this system's `(x, y)`.
    pub fn project(&self, longitude: f64, latitude: f64) -> (f64, f64) {
        match *self {
            LayerCrs::Geographic => (longitude, latitude),
            LayerCrs::WebMercator => web_mercator(longitude, latitude),
            LayerCrs::Utm { zone, north } => transverse_mercator(longitude, latitude, zone, north),
        }
    }
}

impl fmt::Display for LayerCrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerCrs::Geographic => write!(f, "geographic (lon/lat)"),
            LayerCrs::WebMercator => write!(f, "EPSG:3857"),
            LayerCrs::Utm { zone, north } => {
                write!(f, "UTM zone {}{}", zone, if *north { 'N' } else { 'S' })
            }
        }
    }
}

fn utm(zone: u8, north: bool) -> Result<LayerCrs, RoughnessError> {
    if (1..=60).contains(&zone) {
        Ok(LayerCrs::Utm { zone, north })
    } else {
        Err(RoughnessError::UnsupportedCrs(format!("UTM zone {zone}")))
    }
}

/// Finds `UTM ... ZONE 16N` / `UTM_ZONE_16N` / `UTM ZONE 33, SOUTHERN HEMISPHERE` in
/// upper-cased WKT.
fn parse_utm_zone(upper: &str) -> Option<(u8, bool)> {
    let utm_at = upper.find("UTM")?;
    let rest = &upper[utm_at..];
    let zone_at = rest.find("ZONE")?;
    let after = rest[zone_at + "ZONE".len()..].trim_start_matches([' ', '_']);

    let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
    let zone: u8 = digits.parse().ok()?;
    let north = match after[digits.len()..].chars().next() {
        Some('S') => false,
        Some('N') => true,
        _ => !rest.contains("SOUTH"),
    };
    Some((zone, north))
}

fn web_mercator(longitude: f64, latitude: f64) -> (f64, f64) {
    let lat = latitude.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
    let x = WGS84_A * longitude.to_radians();
    let y = WGS84_A * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

fn transverse_mercator(longitude: f64, latitude: f64, zone: u8, north: bool) -> (f64, f64) {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);

    let central_meridian = (f64::from(zone) - 1.0) * 6.0 - 180.0 + 3.0;
    let phi = latitude.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let tan_phi = phi.tan();

    let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let a = cos_phi * (longitude - central_meridian).to_radians();

    let m = WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

    let x = UTM_K0
        * n
        * (a + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
        + UTM_FALSE_EASTING;

    let mut y = UTM_K0
        * (m + n
            * tan_phi
            * (a * a / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));
    if !north {
        y += UTM_FALSE_NORTHING_SOUTH;
    }
    (x, y)
}
