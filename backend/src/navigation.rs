use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use shared::{
    RoutePreference, RouteRequest, RouteResult,
    parking::{DestinationType, ParkNavigation},
    wire::parse_route,
};

use crate::{AppState, error::ProxyError, params};

#[derive(Debug, Default, Deserialize)]
pub struct RouteParams {
    pub start_lat: Option<String>,
    pub start_lon: Option<String>,
    pub end_lat: Option<String>,
    pub end_lon: Option<String>,
    pub prefer_shelter: Option<String>,
}

impl RouteParams {
    pub fn to_request(&self) -> Result<RouteRequest, ProxyError> {
        let start = params::point(
            self.start_lat.as_deref(),
            self.start_lon.as_deref(),
            "start_lat",
            "start_lon",
        )
        .map_err(missing_coordinates)?;
        let end = params::point(
            self.end_lat.as_deref(),
            self.end_lon.as_deref(),
            "end_lat",
            "end_lon",
        )
        .map_err(missing_coordinates)?;

        let preference = if params::flag(self.prefer_shelter.as_deref()) {
            RoutePreference::Sheltered
        } else {
            RoutePreference::Fastest
        };

        Ok(RouteRequest {
            start,
            end,
            preference,
        })
    }
}

fn missing_coordinates(err: ProxyError) -> ProxyError {
    ProxyError::InvalidInput(format!(
        "Missing required coordinate parameters (start_lat, start_lon, end_lat, end_lon). {err}"
    ))
}

/// GET /api/route - walking route between two points
pub async fn route_handler(
    State(state): State<AppState>,
    Query(params): Query<RouteParams>,
) -> Result<Json<RouteResult>, ProxyError> {
    let request = params.to_request()?;
    tracing::info!(
        "route request {:?} -> {:?} ({:?})",
        request.start,
        request.end,
        request.preference
    );

    let body = state
        .upstream
        .get_bytes("/v1/navigation/route", &request.query_pairs()[..])
        .await
        .map_err(|err| match err {
            ProxyError::Unavailable(_) => err,
            other => ProxyError::InvalidRoute(other.to_string()),
        })?;
    let route = parse_route(&body).map_err(|err| ProxyError::InvalidRoute(err.to_string()))?;

    tracing::info!(
        "route has {} points, {:.0} m, {} amenities",
        route.coords.len(),
        route.total_distance_meters,
        route.amenities_along_route.len()
    );
    Ok(Json(route))
}

#[derive(Debug, Default, Deserialize)]
pub struct ToParkParams {
    pub start_lat: Option<String>,
    pub start_lon: Option<String>,
    pub destination_type: Option<String>,
    pub destination_id: Option<String>,
}

/// GET /api/parking/navigation/to-park - directions to an MRT exit or carpark
pub async fn to_park_handler(
    State(state): State<AppState>,
    Query(query): Query<ToParkParams>,
) -> Result<Json<ParkNavigation>, ProxyError> {
    let start = params::point(
        query.start_lat.as_deref(),
        query.start_lon.as_deref(),
        "start_lat",
        "start_lon",
    )?;
    let raw_type = params::required(query.destination_type.as_deref(), "destination_type")?;
    let destination_type = DestinationType::parse(raw_type).ok_or_else(|| {
        ProxyError::InvalidInput(format!(
            "destination_type must be \"mrt\" or \"carpark\", got {raw_type:?}."
        ))
    })?;

    let mut upstream_query = vec![
        ("start_lat", start.lat().to_string()),
        ("start_lon", start.lon().to_string()),
        ("destination_type", destination_type.as_str().to_string()),
    ];
    if let Some(id) = query.destination_id.filter(|id| !id.is_empty()) {
        upstream_query.push(("destination_id", id));
    }

    let navigation = state
        .upstream
        .get_json("/v1/parking/navigation/to-park", &upstream_query)
        .await?;
    Ok(Json(navigation))
}
