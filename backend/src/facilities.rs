use axum::{Json, extract::State};
use shared::{Facility, wire::parse_facilities};

use crate::{AppState, error::ProxyError};

/// GET /api/facilities - every facility in the park, validated
pub async fn facilities_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Facility>>, ProxyError> {
    let body = state
        .upstream
        .get_bytes("/v1/facilities/all_facilities", &[] as &[(&str, &str)])
        .await?;
    let facilities = parse_facilities(&body)?;
    tracing::info!("serving {} facilities", facilities.len());
    Ok(Json(facilities))
}
