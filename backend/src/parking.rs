use axum::{
    Json,
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;
use shared::parking::{CarparkAvailability, MrtExits};

use crate::{AppState, error::ProxyError, params};

const DEFAULT_CARPARK_LIMIT: u32 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct CarparkParams {
    pub user_lat: Option<String>,
    pub user_lon: Option<String>,
    pub limit: Option<String>,
}

/// GET /api/parking/carparks/availability - nearest carparks with free lots
///
/// Failures still carry an empty `carparks` list so the panel keeps rendering.
pub async fn carparks_handler(
    State(state): State<AppState>,
    Query(query): Query<CarparkParams>,
) -> Result<Json<CarparkAvailability>, Response> {
    fetch_carparks(&state, &query)
        .await
        .map(Json)
        .map_err(|err| err.with_empty_list("carparks"))
}

async fn fetch_carparks(
    state: &AppState,
    query: &CarparkParams,
) -> Result<CarparkAvailability, ProxyError> {
    let user = params::point(
        query.user_lat.as_deref(),
        query.user_lon.as_deref(),
        "user_lat",
        "user_lon",
    )?;
    let limit = params::positive_count(query.limit.as_deref(), "limit", DEFAULT_CARPARK_LIMIT)?;

    state.upstream.health_check().await?;

    let upstream_query = [
        ("user_lat", user.lat().to_string()),
        ("user_lon", user.lon().to_string()),
        ("limit", limit.to_string()),
    ];
    let availability: CarparkAvailability = state
        .upstream
        .get_json("/v1/parking/carparks/availability", &upstream_query[..])
        .await?;

    tracing::info!(
        "{} carpark(s) near {:?}",
        availability.carparks.len(),
        user
    );
    Ok(availability)
}

#[derive(Debug, Default, Deserialize)]
pub struct MrtParams {
    pub user_lat: Option<String>,
    pub user_lon: Option<String>,
}

/// GET /api/parking/mrt-exits - MRT exits sorted by distance from the user
pub async fn mrt_exits_handler(
    State(state): State<AppState>,
    Query(query): Query<MrtParams>,
) -> Result<Json<MrtExits>, ProxyError> {
    let user = params::point(
        query.user_lat.as_deref(),
        query.user_lon.as_deref(),
        "user_lat",
        "user_lon",
    )?;
    let upstream_query = [
        ("user_lat", user.lat().to_string()),
        ("user_lon", user.lon().to_string()),
    ];
    let exits: MrtExits = state
        .upstream
        .get_json("/v1/parking/mrt-exits", &upstream_query[..])
        .await?;
    Ok(Json(exits))
}
