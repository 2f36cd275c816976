//! GeoJSON payloads returned by the park backend and their conversion into
//! domain types. Records are validated here so the rest of the workspace only
//! sees well-formed facilities and routes.

use serde::Deserialize;

use crate::facility::{Facility, FacilityHours};
use crate::geo::GeoPoint;
use crate::route::RouteResult;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected payload: {0}")]
    Malformed(String),
    #[error("route has {0} coordinate(s); at least 2 are required")]
    InvalidRoute(usize),
}

#[derive(Debug, Deserialize)]
pub struct FacilityCollection {
    #[serde(default)]
    pub features: Vec<FacilityFeature>,
}

#[derive(Debug, Deserialize)]
pub struct FacilityFeature {
    pub properties: FacilityProperties,
    #[serde(default)]
    pub geometry: Option<PositionGeometry>,
}

#[derive(Debug, Deserialize)]
pub struct FacilityProperties {
    pub objectid: i64,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
    #[serde(default)]
    pub name_left: Option<String>,
    #[serde(default)]
    pub hours: Option<FacilityHours>,
}

#[derive(Debug, Deserialize)]
pub struct PositionGeometry {
    pub coordinates: Vec<f64>,
}

impl FacilityCollection {
    /// Features without a usable class or position are dropped.
    pub fn into_facilities(self) -> Vec<Facility> {
        let total = self.features.len();
        let facilities: Vec<Facility> = self
            .features
            .into_iter()
            .filter_map(|feature| {
                let objectid = feature.properties.objectid;
                match feature.into_facility() {
                    Ok(facility) => Some(facility),
                    Err(reason) => {
                        tracing::warn!("skipping facility {objectid}: {reason}");
                        None
                    }
                }
            })
            .collect();

        if facilities.len() < total {
            tracing::debug!("kept {} of {total} facility features", facilities.len());
        }
        facilities
    }
}

impl FacilityFeature {
    fn into_facility(self) -> Result<Facility, String> {
        let class = self
            .properties
            .class
            .filter(|class| !class.trim().is_empty())
            .ok_or("missing class")?;
        let geometry = self.geometry.ok_or("missing geometry")?;
        let location = lon_lat(&geometry.coordinates)?;

        Ok(Facility {
            objectid: self.properties.objectid,
            class,
            name: self.properties.name_left.filter(|name| !name.is_empty()),
            additional_info: self.properties.additional_info,
            hours: self.properties.hours,
            location,
        })
    }
}

pub fn parse_facilities(body: &[u8]) -> Result<Vec<Facility>, WireError> {
    let collection: FacilityCollection = serde_json::from_slice(body)?;
    Ok(collection.into_facilities())
}

#[derive(Debug, Deserialize)]
pub struct RouteCollection {
    #[serde(default)]
    pub features: Vec<RouteFeature>,
    #[serde(default)]
    pub amenities_along_route: Vec<AmenityRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RouteFeature {
    pub properties: RouteProperties,
    pub geometry: LineGeometry,
}

#[derive(Debug, Deserialize)]
pub struct RouteProperties {
    pub total_distance_meters: f64,
    pub total_duration_seconds: f64,
    #[serde(default)]
    pub segments: u32,
}

#[derive(Debug, Deserialize)]
pub struct LineGeometry {
    pub coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct AmenityRecord {
    pub objectid: i64,
    pub class: String,
    #[serde(default)]
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl TryFrom<RouteCollection> for RouteResult {
    type Error = WireError;

    fn try_from(collection: RouteCollection) -> Result<Self, Self::Error> {
        let feature = collection
            .features
            .into_iter()
            .next()
            .ok_or_else(|| WireError::Malformed("route collection has no features".into()))?;

        let coords = feature
            .geometry
            .coordinates
            .iter()
            .map(|position| lon_lat(position))
            .collect::<Result<Vec<_>, _>>()
            .map_err(WireError::Malformed)?;
        if coords.len() < 2 {
            return Err(WireError::InvalidRoute(coords.len()));
        }

        let amenities_along_route = collection
            .amenities_along_route
            .into_iter()
            .filter_map(|amenity| match GeoPoint::new(amenity.lat, amenity.lon) {
                Ok(location) => Some(Facility {
                    objectid: amenity.objectid,
                    class: amenity.class,
                    name: amenity.name,
                    additional_info: None,
                    hours: None,
                    location,
                }),
                Err(err) => {
                    tracing::warn!("dropping amenity {}: {err}", amenity.objectid);
                    None
                }
            })
            .collect();

        let properties = feature.properties;
        if properties.total_distance_meters < 0.0 || properties.total_duration_seconds < 0.0 {
            return Err(WireError::Malformed("negative route totals".into()));
        }

        Ok(RouteResult {
            total_distance_meters: properties.total_distance_meters,
            total_duration_seconds: properties.total_duration_seconds,
            segments: properties.segments,
            coords,
            amenities_along_route,
        })
    }
}

pub fn parse_route(body: &[u8]) -> Result<RouteResult, WireError> {
    let collection: RouteCollection = serde_json::from_slice(body)?;
    RouteResult::try_from(collection)
}

/// GeoJSON positions are `[lon, lat, ...]`; extra dimensions are ignored.
fn lon_lat(position: &[f64]) -> Result<GeoPoint, String> {
    match position {
        [lon, lat, ..] => GeoPoint::new(*lat, *lon).map_err(|err| err.to_string()),
        _ => Err(format!("position has {} value(s)", position.len())),
    }
}
