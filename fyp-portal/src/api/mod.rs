//! REST client for the FYP backend
//!
//! One [`ApiClient`] per process. It attaches the session's bearer token to
//! every protected call and classifies every failure into a
//! [`PortalError`] kind. Endpoint groups live in the submodules as further
//! `impl ApiClient` blocks.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use fyp_common::config::PortalConfig;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PortalError, Result};
use crate::session::SessionContext;

pub mod auth;
pub mod chat;
pub mod deadlines;
pub mod documents;
pub mod grades;
pub mod notifications;
pub mod reviews;

pub use auth::{LoginResponse, Registered, Registration};
pub use deadlines::NewDeadline;
pub use documents::FileUpload;

const USER_AGENT: &str = concat!("fyp-portal/", env!("CARGO_PKG_VERSION"));

/// Backend API client
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<SessionContext>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| PortalError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn from_config(config: &PortalConfig, session: Arc<SessionContext>) -> Result<Self> {
        Self::new(&config.api_base_url, config.request_timeout, session)
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request without credentials (login, register)
    fn public(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Request carrying the bearer token
    ///
    /// With no credential the call is not sent at all.
    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.session.token().ok_or(PortalError::SessionExpired)?;
        Ok(self.http.request(method, self.url(path)).bearer_auth(token))
    }

    /// Send and turn any non-success response into a classified error
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let had_token = self.session.is_active();
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Backend responded");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = classify(status, &body, had_token);
        if err.is_auth_failure() {
            warn!("Backend rejected credential ({}); ending session", status);
            self.session.end("session expired");
        }
        Err(err)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.execute(request).await?;
        response
            .json()
            .await
            .map_err(|e| PortalError::Decode(e.to_string()))
    }

    async fn unit(&self, request: RequestBuilder) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }

    /// Fetch a list, treating a non-array body as empty
    async fn list<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let response = self.execute(request).await?;
        let text = response
            .text()
            .await
            .map_err(|e| PortalError::Decode(e.to_string()))?;
        coerce_list(&text)
    }
}

fn transport_error(err: reqwest::Error) -> PortalError {
    if err.is_decode() {
        PortalError::Decode(err.to_string())
    } else {
        PortalError::NetworkFailure(err.to_string())
    }
}

/// Parse a list body; anything other than a JSON array yields no items
///
/// Array elements must still decode: an unknown status inside an item is an
/// error, not something to paper over.
pub fn coerce_list<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(|e| PortalError::Decode(e.to_string())))
            .collect(),
        Ok(other) => {
            warn!("Expected a list, got {}; treating as empty", json_kind(&other));
            Ok(Vec::new())
        }
        Err(_) => {
            warn!("List response was not JSON; treating as empty");
            Ok(Vec::new())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Human message and per-field problems out of an error body
///
/// The backend answers `{"error": "..."}`; validation failures may also carry
/// `{"message": "...", "errors": {"field": "problem"}}`.
fn parse_error_body(body: &str) -> (Option<String>, BTreeMap<String, String>) {
    let mut fields = BTreeMap::new();
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        let text = body.trim();
        return ((!text.is_empty()).then(|| text.to_string()), fields);
    };

    let message = ["error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string);

    for key in ["errors", "fieldErrors"] {
        if let Some(Value::Object(map)) = value.get(key) {
            for (field, problem) in map {
                let text = problem
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| problem.to_string());
                fields.insert(field.clone(), text);
            }
        }
    }
    (message, fields)
}

/// Map a failed response onto the error taxonomy
pub fn classify(status: StatusCode, body: &str, had_token: bool) -> PortalError {
    let (message, fields) = parse_error_body(body);
    let message = message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });

    match status {
        StatusCode::UNAUTHORIZED => PortalError::SessionExpired,
        StatusCode::FORBIDDEN if !had_token => PortalError::SessionExpired,
        StatusCode::FORBIDDEN => PortalError::UnauthorizedActor(message),
        StatusCode::NOT_FOUND => PortalError::NotFound(message),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => PortalError::StaleState(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            PortalError::ValidationFailure { message, fields }
        }
        s => PortalError::Server {
            status: s.as_u16(),
            message,
        },
    }
}
