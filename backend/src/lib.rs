pub mod config;
pub mod error;
pub mod facilities;
pub mod navigation;
pub mod params;
pub mod parking;
pub mod upstream;
pub mod weather;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::upstream::Upstream;
use crate::weather::WeatherCache;

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<Upstream>,
    pub weather: Arc<WeatherCache>,
}

impl AppState {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            upstream: Arc::new(Upstream::new(config)?),
            weather: Arc::new(WeatherCache::default()),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/facilities", get(facilities::facilities_handler))
        .route("/api/route", get(navigation::route_handler))
        .route(
            "/api/parking/carparks/availability",
            get(parking::carparks_handler),
        )
        .route("/api/parking/mrt-exits", get(parking::mrt_exits_handler))
        .route(
            "/api/parking/navigation/to-park",
            get(navigation::to_park_handler),
        )
        .route("/api/weather/now", get(weather::weather_now_handler))
        .route("/api/weather/full", get(weather::weather_full_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
