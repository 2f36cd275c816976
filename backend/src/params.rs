//! Query-string validation. Everything here runs before the backend is
//! contacted.

use shared::GeoPoint;

use crate::error::ProxyError;

pub fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ProxyError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ProxyError::InvalidInput(format!("Missing required parameter {name}.")))
}

fn coordinate(value: Option<&str>, name: &str) -> Result<f64, ProxyError> {
    let raw = required(value, name)?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            ProxyError::InvalidInput(format!("Parameter {name} must be a number, got {raw:?}."))
        })
}

/// Parses a `(lat, lon)` parameter pair into a validated point.
pub fn point(
    lat: Option<&str>,
    lon: Option<&str>,
    lat_name: &str,
    lon_name: &str,
) -> Result<GeoPoint, ProxyError> {
    let lat = coordinate(lat, lat_name)?;
    let lon = coordinate(lon, lon_name)?;
    GeoPoint::new(lat, lon).map_err(|err| ProxyError::InvalidInput(err.to_string()))
}

/// Anything other than `true`/`1` (case-insensitive) reads as false.
pub fn flag(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "1")
        .unwrap_or(false)
}

pub fn positive_count(value: Option<&str>, name: &str, default: u32) -> Result<u32, ProxyError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ProxyError::InvalidInput(format!("Parameter {name} must be a positive integer."))
            }),
    }
}
