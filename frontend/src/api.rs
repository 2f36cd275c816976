use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    ApiError, Facility, ForecastSummary, GeoPoint, RouteRequest, RouteResult,
    parking::{CarparkAvailability, DestinationType, MrtExits, ParkNavigation},
};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub fn api_root() -> String {
    if let Some(url) = option_env!("PARKWAY_API_ROOT") {
        return url.trim_end_matches('/').to_string();
    }
    "http://localhost:3000".to_string()
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Unavailable("request timed out".into())
        } else {
            ClientError::Unavailable(err.to_string())
        }
    }
}

/// Client for the parkway proxy.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    root: String,
}

impl ApiClient {
    pub fn new(root: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(root, REQUEST_TIMEOUT)
    }

    /// Client for the proxy named by `PARKWAY_API_ROOT` at build time.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(api_root())
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn with_timeout(root: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            root: root.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn facilities(&self) -> Result<Vec<Facility>, ClientError> {
        self.get("/api/facilities", &[]).await
    }

    pub async fn route(&self, request: &RouteRequest) -> Result<RouteResult, ClientError> {
        tracing::debug!(
            "sending route request start=({:.5},{:.5}) end=({:.5},{:.5})",
            request.start.lat(),
            request.start.lon(),
            request.end.lat(),
            request.end.lon()
        );
        self.get("/api/route", &request.query_pairs()).await
    }

    pub async fn weather_now(&self) -> Result<ForecastSummary, ClientError> {
        let payload: Value = self.get("/api/weather/now", &[]).await?;
        ForecastSummary::from_weather_json(&payload)
            .ok_or_else(|| ClientError::Malformed("weather record has no forecast".into()))
    }

    pub async fn carparks(
        &self,
        user: GeoPoint,
        limit: u32,
    ) -> Result<CarparkAvailability, ClientError> {
        self.get(
            "/api/parking/carparks/availability",
            &[
                ("user_lat", user.lat().to_string()),
                ("user_lon", user.lon().to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    pub async fn mrt_exits(&self, user: GeoPoint) -> Result<MrtExits, ClientError> {
        self.get(
            "/api/parking/mrt-exits",
            &[
                ("user_lat", user.lat().to_string()),
                ("user_lon", user.lon().to_string()),
            ],
        )
        .await
    }

    /// Directions from `start` to the MRT exit or carpark serving the park.
    pub async fn to_park(
        &self,
        start: GeoPoint,
        destination_type: DestinationType,
        destination_id: Option<&str>,
    ) -> Result<ParkNavigation, ClientError> {
        let mut query = vec![
            ("start_lat", start.lat().to_string()),
            ("start_lon", start.lon().to_string()),
            ("destination_type", destination_type.as_str().to_string()),
        ];
        if let Some(id) = destination_id {
            query.push(("destination_id", id.to_string()));
        }
        self.get("/api/parking/navigation/to-park", &query).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .get(format!("{}{path}", self.root))
            .query(query)
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiError>(&bytes)
                .map(|body| body.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|err| ClientError::Malformed(err.to_string()))
    }
}
