use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use shared::weather::apparent_temperature;
use tokio::sync::RwLock;

use crate::{AppState, error::ProxyError};

const FALLBACK_REASON: &str = "Weather service unavailable; showing the last known conditions";

/// Last good payload per weather endpoint, served with `is_fallback_data`
/// while the backend is down.
#[derive(Default)]
pub struct WeatherCache {
    now: RwLock<Option<Snapshot>>,
    full: RwLock<Option<Snapshot>>,
}

struct Snapshot {
    payload: Value,
    fetched_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug)]
enum Feed {
    Now,
    Full,
}

impl WeatherCache {
    fn slot(&self, feed: Feed) -> &RwLock<Option<Snapshot>> {
        match feed {
            Feed::Now => &self.now,
            Feed::Full => &self.full,
        }
    }

    async fn store(&self, feed: Feed, payload: &Value) {
        *self.slot(feed).write().await = Some(Snapshot {
            payload: payload.clone(),
            fetched_at: Utc::now(),
        });
    }

    async fn fallback(&self, feed: Feed, err: &ProxyError) -> Value {
        tracing::warn!("weather {feed:?} unavailable ({err}); serving fallback");
        let cached = self.slot(feed).read().await;
        let (mut payload, cached_at) = match cached.as_ref() {
            Some(snapshot) => (snapshot.payload.clone(), Some(snapshot.fetched_at)),
            None => (default_weather(), None),
        };

        if let Some(object) = payload.as_object_mut() {
            object.insert("is_fallback_data".into(), Value::Bool(true));
            object.insert("fallback_reason".into(), Value::from(FALLBACK_REASON));
            object.insert(
                "cached_at".into(),
                cached_at.map_or(Value::Null, |at| Value::from(at.to_rfc3339())),
            );
        }
        payload
    }
}

/// Neutral record used before any real reading has been seen; its forecast
/// code matches no advisory rule.
fn default_weather() -> Value {
    json!({
        "data": {
            "records": [{
                "general": {
                    "forecast": {"code": "NA", "text": "Not available"},
                    "temperature": {"high": null, "low": null}
                }
            }]
        }
    })
}

/// GET /api/weather/now - two-hour forecast
pub async fn weather_now_handler(State(state): State<AppState>) -> Json<Value> {
    match state.upstream.get_value("/v1/weather/now").await {
        Ok(payload) => {
            state.weather.store(Feed::Now, &payload).await;
            Json(payload)
        }
        Err(err) => Json(state.weather.fallback(Feed::Now, &err).await),
    }
}

/// GET /api/weather/full - combined forecast, wind and PSI, plus the apparent
/// temperature when that feed answers
pub async fn weather_full_handler(State(state): State<AppState>) -> Json<Value> {
    let (weather, apparent) = tokio::join!(
        state.upstream.get_value("/v1/weather/full"),
        state.upstream.get_value("/v1/apparent-temperature"),
    );

    let mut payload = match weather {
        Ok(payload) => {
            state.weather.store(Feed::Full, &payload).await;
            payload
        }
        Err(err) => state.weather.fallback(Feed::Full, &err).await,
    };

    let apparent = match apparent {
        Ok(reading) => {
            let value = apparent_temperature(&reading);
            if value.is_none() {
                tracing::warn!("apparent temperature response structure unexpected");
            }
            value
        }
        Err(err) => {
            tracing::warn!("failed to fetch apparent temperature: {err}");
            None
        }
    };

    if let Some(object) = payload.as_object_mut() {
        object.insert("apparentTemperature".into(), Value::from(apparent));
    }
    Json(payload)
}
