use axum::body::Bytes;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ProxyConfig;
use crate::error::ProxyError;

/// HTTP client for the park backend. Every request, including the health
/// check, is bounded by the configured timeout.
#[derive(Clone)]
pub struct Upstream {
    client: Client,
    base_url: String,
}

impl Upstream {
    pub fn new(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// HEAD on the backend's docs page; any transport failure means the
    /// backend is down.
    pub async fn health_check(&self) -> Result<(), ProxyError> {
        let url = self.url("/docs");
        let response = self.client.head(&url).send().await.map_err(|err| {
            tracing::error!("backend health check failed for {url}: {err}");
            ProxyError::Unavailable(
                "Please ensure the park backend is running and reachable".into(),
            )
        })?;
        tracing::debug!("backend health check status: {}", response.status());
        Ok(())
    }

    /// GET `path` and return the raw body of a 2xx response.
    pub async fn get_bytes<Q>(&self, path: &str, query: &Q) -> Result<Bytes, ProxyError>
    where
        Q: serde::Serialize + ?Sized,
    {
        let url = self.url(path);
        tracing::debug!("fetching {url}");

        let response = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .query(query)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            return Ok(body);
        }

        let text = String::from_utf8_lossy(&body).into_owned();
        tracing::error!("backend responded to {path} with {status}");
        if text.contains("<!DOCTYPE html>") {
            return Err(ProxyError::EndpointNotFound);
        }
        Err(ProxyError::Upstream {
            status: status.as_u16(),
            body: text,
        })
    }

    pub async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T, ProxyError>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let body = self.get_bytes(path, query).await?;
        serde_json::from_slice(&body).map_err(|err| {
            tracing::error!(
                "failed to parse response from {path}: {err}. Body: {}",
                String::from_utf8_lossy(&body[..body.len().min(500)])
            );
            ProxyError::Malformed(err.to_string())
        })
    }

    /// Like [`Upstream::get_json`] for untyped payloads, treating a top-level
    /// `error` field as a failure.
    pub async fn get_value(&self, path: &str) -> Result<Value, ProxyError> {
        let value: Value = self.get_json(path, &[] as &[(&str, &str)]).await?;
        match value.get("error") {
            Some(error) => Err(ProxyError::Upstream {
                status: 502,
                body: error.to_string(),
            }),
            None => Ok(value),
        }
    }
}
