use serde::{Deserialize, Serialize};

use crate::facility::Facility;
use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePreference {
    #[default]
    Fastest,
    Sheltered,
}

impl RoutePreference {
    pub fn prefers_shelter(self) -> bool {
        self == RoutePreference::Sheltered
    }
}

/// Query sent to the routing collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start: GeoPoint,
    pub end: GeoPoint,
    #[serde(default)]
    pub preference: RoutePreference,
}

impl RouteRequest {
    pub fn query_pairs(&self) -> [(&'static str, String); 5] {
        [
            ("start_lat", self.start.lat().to_string()),
            ("start_lon", self.start.lon().to_string()),
            ("end_lat", self.end.lat().to_string()),
            ("end_lon", self.end.lon().to_string()),
            ("prefer_shelter", self.preference.prefers_shelter().to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub total_distance_meters: f64,
    pub total_duration_seconds: f64,
    #[serde(default)]
    pub segments: u32,
    pub coords: Vec<GeoPoint>,
    #[serde(default)]
    pub amenities_along_route: Vec<Facility>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OverlayError {
    #[error("route has {0} coordinate(s); at least 2 are required")]
    InvalidRoute(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStyle {
    Primary,
    Secondary,
}

impl RouteStyle {
    pub fn line_color(self) -> &'static str {
        match self {
            RouteStyle::Primary => "#3b82f6",
            RouteStyle::Secondary => "#22c55e",
        }
    }
}

impl From<RoutePreference> for RouteStyle {
    fn from(preference: RoutePreference) -> Self {
        match preference {
            RoutePreference::Fastest => RouteStyle::Primary,
            RoutePreference::Sheltered => RouteStyle::Secondary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmenityKind {
    Shelter,
    Toilet,
    Generic,
}

impl AmenityKind {
    pub fn from_class(class: &str) -> Self {
        match class {
            "SHELTER" => AmenityKind::Shelter,
            "TOILET" => AmenityKind::Toilet,
            _ => AmenityKind::Generic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmenityMarker {
    pub objectid: i64,
    pub kind: AmenityKind,
    pub location: GeoPoint,
    pub label: String,
}

impl AmenityMarker {
    fn for_facility(facility: &Facility) -> Self {
        let label = match facility.name.as_deref() {
            Some(name) if !name.is_empty() => format!("{}: {}", facility.class, name),
            _ => facility.class.clone(),
        };
        Self {
            objectid: facility.objectid,
            kind: AmenityKind::from_class(&facility.class),
            location: facility.location,
            label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl RouteBounds {
    fn enclosing(points: &[GeoPoint]) -> Self {
        points.iter().fold(
            RouteBounds {
                min_lat: f64::INFINITY,
                max_lat: f64::NEG_INFINITY,
                min_lon: f64::INFINITY,
                max_lon: f64::NEG_INFINITY,
            },
            |bounds, p| RouteBounds {
                min_lat: bounds.min_lat.min(p.lat()),
                max_lat: bounds.max_lat.max(p.lat()),
                min_lon: bounds.min_lon.min(p.lon()),
                max_lon: bounds.max_lon.max(p.lon()),
            },
        )
    }
}

/// Renderer-ready form of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRoute {
    pub polyline: Vec<GeoPoint>,
    pub style: RouteStyle,
    pub bounds: RouteBounds,
    pub markers: Vec<AmenityMarker>,
    pub total_distance_meters: f64,
    pub total_duration_seconds: f64,
}

/// Turns a route from the routing collaborator into a polyline plus amenity
/// markers. Markers are only produced for sheltered routes.
pub fn compose_overlay(
    route: &RouteResult,
    preference: RoutePreference,
) -> Result<DisplayRoute, OverlayError> {
    if route.coords.len() < 2 {
        return Err(OverlayError::InvalidRoute(route.coords.len()));
    }

    let markers = match preference {
        RoutePreference::Sheltered => route
            .amenities_along_route
            .iter()
            .map(AmenityMarker::for_facility)
            .collect(),
        RoutePreference::Fastest => Vec::new(),
    };

    Ok(DisplayRoute {
        polyline: route.coords.clone(),
        style: preference.into(),
        bounds: RouteBounds::enclosing(&route.coords),
        markers,
        total_distance_meters: route.total_distance_meters,
        total_duration_seconds: route.total_duration_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    fn amenity(objectid: i64, class: &str, name: Option<&str>) -> Facility {
        Facility {
            objectid,
            class: class.into(),
            name: name.map(Into::into),
            additional_info: None,
            hours: None,
            location: point(1.3785, 103.9505),
        }
    }

    fn sample_route() -> RouteResult {
        RouteResult {
            total_distance_meters: 420.0,
            total_duration_seconds: 300.0,
            segments: 3,
            coords: vec![
                point(1.3780, 103.9500),
                point(1.3786, 103.9507),
                point(1.3792, 103.9503),
            ],
            amenities_along_route: vec![
                amenity(10, "SHELTER", Some("Shelter 4")),
                amenity(11, "TOILET", None),
                amenity(12, "BENCH", Some("")),
            ],
        }
    }

    #[test]
    fn fastest_route_has_no_markers() {
        let display = compose_overlay(&sample_route(), RoutePreference::Fastest).unwrap();
        assert!(display.markers.is_empty());
        assert_eq!(display.style, RouteStyle::Primary);
        assert_eq!(display.polyline.len(), 3);
    }

    #[test]
    fn sheltered_route_marks_every_amenity() {
        let display = compose_overlay(&sample_route(), RoutePreference::Sheltered).unwrap();
        assert_eq!(display.style, RouteStyle::Secondary);
        let kinds: Vec<AmenityKind> = display.markers.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![AmenityKind::Shelter, AmenityKind::Toilet, AmenityKind::Generic]
        );
        assert_eq!(display.markers[0].label, "SHELTER: Shelter 4");
        assert_eq!(display.markers[1].label, "TOILET");
        assert_eq!(display.markers[2].label, "BENCH");
    }

    #[test]
    fn single_point_route_is_rejected() {
        let mut route = sample_route();
        route.coords.truncate(1);
        assert_eq!(
            compose_overlay(&route, RoutePreference::Sheltered),
            Err(OverlayError::InvalidRoute(1))
        );
        route.coords.clear();
        assert_eq!(
            compose_overlay(&route, RoutePreference::Fastest),
            Err(OverlayError::InvalidRoute(0))
        );
    }

    #[test]
    fn bounds_enclose_polyline() {
        let display = compose_overlay(&sample_route(), RoutePreference::Fastest).unwrap();
        assert_eq!(
            display.bounds,
            RouteBounds {
                min_lat: 1.3780,
                max_lat: 1.3792,
                min_lon: 103.9500,
                max_lon: 103.9507,
            }
        );
    }

    #[test]
    fn style_colors_follow_preference() {
        assert_eq!(RouteStyle::from(RoutePreference::Sheltered).line_color(), "#22c55e");
        assert_eq!(RouteStyle::from(RoutePreference::Fastest).line_color(), "#3b82f6");
    }

    #[test]
    fn request_encodes_shelter_flag() {
        let request = RouteRequest {
            start: point(1.37, 103.94),
            end: point(1.38, 103.95),
            preference: RoutePreference::Sheltered,
        };
        let pairs = request.query_pairs();
        assert_eq!(pairs[0], ("start_lat", "1.37".to_string()));
        assert_eq!(pairs[4], ("prefer_shelter", "true".to_string()));
    }
}
