pub mod facility;
pub mod geo;
pub mod parking;
pub mod route;
pub mod weather;
pub mod wire;

use serde::{Deserialize, Serialize};

pub use facility::{
    DEFAULT_NEARBY_RADIUS_METERS, FACILITY_CATEGORIES, Facility, FacilityCategory, FacilityGroup,
    FacilityHours, FacilityWithDistance, ListedFacility, category_of, find_nearby,
    group_by_category,
};
pub use geo::{
    FarFromPark, GeoError, GeoPoint, PASIR_RIS_PARK, ParkBounds, distance_meters, is_far_from_park,
};
pub use route::{
    AmenityKind, AmenityMarker, DisplayRoute, OverlayError, RouteBounds, RoutePreference,
    RouteRequest, RouteResult, RouteStyle, compose_overlay,
};
pub use weather::{ForecastSummary, SuggestionReason, needs_weather_alert, should_suggest_sheltered};

/// Error body returned by the proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
