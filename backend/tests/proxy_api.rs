use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{Query, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::get,
};
use backend::{AppState, config::ProxyConfig, create_router};
use hyper::StatusCode;
use serde_json::{Value, json};
use shared::{Facility, RouteResult};
use tower::ServiceExt;

#[derive(Clone, Default)]
struct FakeBackend {
    weather_down: Arc<AtomicBool>,
}

async fn all_facilities() -> Json<Value> {
    Json(json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "properties": {"objectid": 1, "class": "TOILET", "additional_info": null, "name_left": "Toilet A"},
             "geometry": {"type": "Point", "coordinates": [103.9510, 1.3790]}},
            {"type": "Feature",
             "properties": {"objectid": 2, "class": "DRINKING FOUNTAIN"},
             "geometry": {"type": "Point", "coordinates": [103.9512, 1.3795]}},
            {"type": "Feature",
             "properties": {"objectid": 3, "class": "SHELTER"},
             "geometry": null}
        ]
    }))
}

async fn navigation_route(Query(query): Query<HashMap<String, String>>) -> Response {
    match query.get("end_lat").map(String::as_str) {
        Some("1.6") => {
            return Json(json!({"type": "FeatureCollection", "features": []})).into_response();
        }
        Some("1.7") => return "not json".into_response(),
        _ => {}
    }
    let coordinates = if query.get("end_lat").map(String::as_str) == Some("1.5") {
        json!([[103.9500, 1.3780]])
    } else {
        json!([[103.9500, 1.3780], [103.9507, 1.3786], [103.9510, 1.3790]])
    };
    let amenities = if query.get("prefer_shelter").map(String::as_str) == Some("true") {
        json!([{"objectid": 3, "class": "SHELTER", "name": "Shelter 3", "lat": 1.3786, "lon": 103.9507}])
    } else {
        json!([])
    };
    Json(json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": coordinates},
            "properties": {"total_distance_meters": 180.0, "total_duration_seconds": 130.0, "segments": 2}
        }],
        "amenities_along_route": amenities
    }))
    .into_response()
}

async fn carparks(Query(query): Query<HashMap<String, String>>) -> Response {
    match query.get("user_lat").map(String::as_str) {
        Some("1.1") => return "{\"carparks\": [".into_response(),
        Some("1.2") => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "<!DOCTYPE html><html><body>Not Found</body></html>",
            )
                .into_response();
        }
        _ => {}
    }
    assert_eq!(query.get("limit").map(String::as_str), Some("2"));
    Json(json!({
        "carparks": [{
            "carpark_id": "PR1",
            "development": "Pasir Ris Park C",
            "lat": 1.381, "lon": 103.952,
            "distance_meters": 300,
            "lots_by_type": {"C": 30},
            "total_available": 30,
            "recommendation_score": 10.0
        }],
        "timestamp": "2025-01-01T10:00:00+08:00"
    }))
    .into_response()
}

async fn mrt_exits() -> Json<Value> {
    Json(json!({"mrt_exits": [
        {"exit": "B", "name": "Pasir Ris", "lat": 1.3730, "lon": 103.9493, "description": "Bus interchange", "distance_meters": 800}
    ]}))
}

async fn weather_now(State(fake): State<FakeBackend>) -> Response {
    if fake.weather_down.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    Json(json!({
        "data": {"records": [{"general": {
            "forecast": {"code": "RA", "text": "Rain"},
            "temperature": {"high": 29, "low": 24}
        }}]}
    }))
    .into_response()
}

async fn weather_full() -> Json<Value> {
    Json(json!({"forecast": {"code": "FD"}, "psi": 42}))
}

async fn apparent_temperature() -> Json<Value> {
    Json(json!({"code": 0, "data": {"readings": [{"data": [{"value": 33.4}]}]}}))
}

async fn to_park() -> Json<Value> {
    Json(json!({
        "destination_type": "mrt",
        "destination": {"exit": "B", "name": "Pasir Ris"},
        "start": {"lat": 1.35, "lon": 103.94},
        "end": {"lat": 1.3730, "lon": 103.9493},
        "distance_meters": 2650.0
    }))
}

async fn spawn_backend(fake: FakeBackend) -> SocketAddr {
    let app = Router::new()
        .route("/docs", get(|| async { "docs" }))
        .route("/v1/facilities/all_facilities", get(all_facilities))
        .route("/v1/navigation/route", get(navigation_route))
        .route("/v1/parking/carparks/availability", get(carparks))
        .route("/v1/parking/mrt-exits", get(mrt_exits))
        .route("/v1/parking/navigation/to-park", get(to_park))
        .route("/v1/weather/now", get(weather_now))
        .route("/v1/weather/full", get(weather_full))
        .route("/v1/apparent-temperature", get(apparent_temperature))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Address with nothing listening on it.
async fn dead_backend() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn proxy_for(addr: SocketAddr) -> Router {
    let config = ProxyConfig::for_backend(format!("http://{addr}"));
    create_router(AppState::from_config(&config).unwrap())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn facilities_are_validated() {
    let app = proxy_for(spawn_backend(FakeBackend::default()).await);
    let (status, body) = get_json(&app, "/api/facilities").await;
    assert_eq!(status, StatusCode::OK);

    let facilities: Vec<Facility> = serde_json::from_value(body).unwrap();
    assert_eq!(facilities.len(), 2);
    assert_eq!(facilities[0].name.as_deref(), Some("Toilet A"));
    assert_eq!(facilities[1].location.lat(), 1.3795);
}

#[tokio::test]
async fn sheltered_route_carries_amenities() {
    let app = proxy_for(spawn_backend(FakeBackend::default()).await);
    let (status, body) = get_json(
        &app,
        "/api/route?start_lat=1.3780&start_lon=103.9500&end_lat=1.3790&end_lon=103.9510&prefer_shelter=true",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let route: RouteResult = serde_json::from_value(body).unwrap();
    assert_eq!(route.coords.len(), 3);
    assert_eq!(route.total_distance_meters, 180.0);
    assert_eq!(route.amenities_along_route.len(), 1);
    assert_eq!(route.amenities_along_route[0].class, "SHELTER");
}

#[tokio::test]
async fn route_without_coordinates_never_reaches_backend() {
    let app = proxy_for(dead_backend().await);
    let (status, body) =
        get_json(&app, "/api/route?start_lat=1.378&end_lat=1.379&end_lon=103.951").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Missing required coordinate parameters"));
}

#[tokio::test]
async fn degenerate_route_is_rejected() {
    let app = proxy_for(spawn_backend(FakeBackend::default()).await);
    let (status, body) = get_json(
        &app,
        "/api/route?start_lat=1.3780&start_lon=103.9500&end_lat=1.5&end_lon=103.9510",
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("unable to calculate route"));
}

#[tokio::test]
async fn route_without_features_cannot_be_calculated() {
    let app = proxy_for(spawn_backend(FakeBackend::default()).await);
    for end_lat in ["1.6", "1.7"] {
        let uri = format!(
            "/api/route?start_lat=1.3780&start_lon=103.9500&end_lat={end_lat}&end_lon=103.9510"
        );
        let (status, body) = get_json(&app, &uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("unable to calculate route"));
    }
}

#[tokio::test]
async fn route_with_backend_down_is_unavailable() {
    let app = proxy_for(dead_backend().await);
    let (status, _) = get_json(
        &app,
        "/api/route?start_lat=1.3780&start_lon=103.9500&end_lat=1.3790&end_lon=103.9510",
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn carparks_are_forwarded() {
    let app = proxy_for(spawn_backend(FakeBackend::default()).await);
    let (status, body) = get_json(
        &app,
        "/api/parking/carparks/availability?user_lat=1.38&user_lon=103.95&limit=2",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["carparks"][0]["carpark_id"], "PR1");
    assert_eq!(body["carparks"][0]["lots_by_type"]["C"], 30);
}

#[tokio::test]
async fn carparks_with_backend_down_return_empty_list() {
    let app = proxy_for(dead_backend().await);
    let (status, body) = get_json(
        &app,
        "/api/parking/carparks/availability?user_lat=1.38&user_lon=103.95",
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "backend service unavailable");
    assert_eq!(body["carparks"], json!([]));
}

#[tokio::test]
async fn malformed_carparks_return_empty_list() {
    let app = proxy_for(spawn_backend(FakeBackend::default()).await);
    let (status, body) = get_json(
        &app,
        "/api/parking/carparks/availability?user_lat=1.1&user_lon=103.95",
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "invalid JSON response from backend");
    assert_eq!(body["carparks"], json!([]));
}

#[tokio::test]
async fn carparks_html_error_page_is_not_found() {
    let app = proxy_for(spawn_backend(FakeBackend::default()).await);
    let (status, body) = get_json(
        &app,
        "/api/parking/carparks/availability?user_lat=1.2&user_lon=103.95",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "backend endpoint not found");
    assert_eq!(body["carparks"], json!([]));
}

#[tokio::test]
async fn mrt_exits_require_user_location() {
    let app = proxy_for(spawn_backend(FakeBackend::default()).await);
    let (status, _) = get_json(&app, "/api/parking/mrt-exits?user_lat=1.38").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) =
        get_json(&app, "/api/parking/mrt-exits?user_lat=1.38&user_lon=103.95").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mrt_exits"][0]["exit"], "B");
}

#[tokio::test]
async fn to_park_validates_destination_type() {
    let app = proxy_for(spawn_backend(FakeBackend::default()).await);
    let (status, _) = get_json(
        &app,
        "/api/parking/navigation/to-park?start_lat=1.35&start_lon=103.94&destination_type=bus",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_json(
        &app,
        "/api/parking/navigation/to-park?start_lat=1.35&start_lon=103.94&destination_type=mrt",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destination_type"], "mrt");
}

#[tokio::test]
async fn full_weather_merges_apparent_temperature() {
    let app = proxy_for(spawn_backend(FakeBackend::default()).await);
    let (status, body) = get_json(&app, "/api/weather/full").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["psi"], 42);
    assert_eq!(body["apparentTemperature"], 33.4);
    assert!(body.get("is_fallback_data").is_none());
}

#[tokio::test]
async fn weather_without_backend_uses_default_fallback() {
    let app = proxy_for(dead_backend().await);
    let (status, body) = get_json(&app, "/api/weather/now").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_fallback_data"], true);
    assert_eq!(body["cached_at"], Value::Null);
    assert_eq!(body["data"]["records"][0]["general"]["forecast"]["code"], "NA");
}

#[tokio::test]
async fn weather_outage_serves_last_known_reading() {
    let fake = FakeBackend::default();
    let app = proxy_for(spawn_backend(fake.clone()).await);

    let (_, live) = get_json(&app, "/api/weather/now").await;
    assert!(live.get("is_fallback_data").is_none());

    fake.weather_down.store(true, Ordering::SeqCst);
    let (status, cached) = get_json(&app, "/api/weather/now").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cached["is_fallback_data"], true);
    assert!(cached["cached_at"].is_string());
    assert_eq!(cached["data"]["records"][0]["general"]["forecast"]["code"], "RA");
}
