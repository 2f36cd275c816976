use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use shared::wire::WireError;
use thiserror::Error;

/// Longest slice of an upstream body echoed back in `details`.
const MAX_DETAILS_LEN: usize = 500;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("backend service unavailable")]
    Unavailable(String),
    #[error("backend endpoint not found")]
    EndpointNotFound,
    #[error("backend error: {status}")]
    Upstream { status: u16, body: String },
    #[error("invalid JSON response from backend")]
    Malformed(String),
    #[error("unable to calculate route: {0}")]
    InvalidRoute(String),
}

impl From<WireError> for ProxyError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::InvalidRoute(_) => ProxyError::InvalidRoute(err.to_string()),
            WireError::Json(_) | WireError::Malformed(_) => ProxyError::Malformed(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "backend did not answer in time".to_string()
        } else {
            err.to_string()
        };
        ProxyError::Unavailable(reason)
    }
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ProxyError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::EndpointNotFound => StatusCode::NOT_FOUND,
            ProxyError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::Malformed(_) | ProxyError::InvalidRoute(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            ProxyError::InvalidInput(_) => None,
            ProxyError::Unavailable(reason) => Some(reason.clone()),
            ProxyError::EndpointNotFound => {
                Some("The requested endpoint does not exist on the backend".into())
            }
            ProxyError::Upstream { body, .. } => Some(truncate(body)),
            ProxyError::Malformed(reason) | ProxyError::InvalidRoute(reason) => {
                Some(truncate(reason))
            }
        }
    }

    fn body(&self) -> Value {
        let mut body = json!({ "error": self.to_string() });
        if let Some(details) = self.details() {
            body["details"] = Value::String(details);
        }
        body
    }

    /// Same error, with an empty `key` list in the body so list views keep
    /// rendering.
    pub fn with_empty_list(self, key: &'static str) -> Response {
        let mut body = self.body();
        body[key] = json!([]);
        (self.status(), Json(body)).into_response()
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            ProxyError::InvalidInput(_) => tracing::debug!("rejected request: {self}"),
            _ => tracing::warn!("upstream failure: {self} ({:?})", self.details()),
        }
        (self.status(), Json(self.body())).into_response()
    }
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_DETAILS_LEN) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
