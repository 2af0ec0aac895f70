//! HTTP plumbing for the accounts API.
//!
//! This module keeps connectivity logic in one place so the session layer can
//! share request construction, timeouts, and error mapping. The reqwest client
//! carries a cookie store; the backend session cookie is attached and updated
//! by it without any handling here.
//!
//! Flow Overview:
//! - Build an `ApiTransport` from a validated base URL.
//! - Call `request_json` with `/api/...` paths; it returns status + raw body.
//! - `into_envelope` folds the response into the error taxonomy and exposes
//!   the parsed `{success, message, ...}` body for typed reads.
//! - The CSRF header is optional; the session layer decides when to attach it.

pub mod types;

use crate::error::{AuthError, fallback_message};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{Instrument, debug, info_span};
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Header the backend checks on credentialed requests.
pub(crate) const CSRF_HEADER: &str = "X-CSRF-Token";

/// Cap for messages lifted out of non-JSON error bodies.
const MAX_ERROR_CHARS: usize = 200;

/// Shared HTTP client plus the validated base URL.
#[derive(Clone, Debug)]
pub(crate) struct ApiTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ApiTransport {
    /// Builds the transport, validating the base URL up front so a typo fails
    /// at construction instead of on the first request.
    pub(crate) fn new(base_url: &str, user_agent: &str) -> Result<Self, AuthError> {
        let base_url = normalize_base_url(base_url)?;
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AuthError::Network(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { client, base_url })
    }

    /// Full URL for an API path, tolerant of slashes on either side.
    pub(crate) fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Executes a JSON request. The CSRF token and body are optional; the
    /// session cookie rides along via the cookie store.
    pub(crate) async fn request_json(
        &self,
        method: Method,
        path: &str,
        csrf_token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<ApiResponse, AuthError> {
        let url = self.endpoint_url(path);
        let span = info_span!("auth.request", http.method = %method, url = %url);

        async {
            let mut request = self
                .client
                .request(method, &url)
                .header("Accept", "application/json");
            if let Some(token) = csrf_token {
                request = request.header(CSRF_HEADER, token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(|err| map_send_error(&url, &err))?;
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "auth response");

            Ok(ApiResponse { url, status, body })
        }
        .instrument(span)
        .await
    }
}

/// Response wrapper for accounts API requests.
pub(crate) struct ApiResponse {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Folds the response into the error taxonomy. Non-2xx becomes an
    /// [`AuthError`]; 2xx bodies parse into an [`Envelope`] for typed reads.
    pub(crate) fn into_envelope(self) -> Result<Envelope, AuthError> {
        let status = self.status.as_u16();
        if !self.status.is_success() {
            return Err(AuthError::from_status(status, extract_message(&self.body)));
        }

        let value = if self.body.trim().is_empty() {
            // An empty success body carries no `success` flag, so it reads as
            // a logical failure downstream, same as the backend sending {}.
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(&self.body).map_err(|err| {
                debug!("undecodable body from {}: {err}", self.url);
                AuthError::Auth {
                    status,
                    message: fallback_message(status).to_string(),
                }
            })?
        };

        Ok(Envelope { status, value })
    }
}

/// Parsed 2xx body plus the status it arrived with.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub status: u16,
    value: Value,
}

impl Envelope {
    pub(crate) fn success(&self) -> bool {
        self.value
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub(crate) fn message(&self) -> Option<String> {
        self.value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// The backend signals logical failure through `success: false` on 2xx
    /// responses as well; normalize that into the taxonomy here.
    pub(crate) fn require_success(self) -> Result<Self, AuthError> {
        if self.success() {
            Ok(self)
        } else {
            let status = self.status;
            let message = self
                .message()
                .unwrap_or_else(|| fallback_message(status).to_string());
            Err(AuthError::Auth { status, message })
        }
    }

    pub(crate) fn decode<T: DeserializeOwned>(self) -> Result<T, AuthError> {
        let status = self.status;
        serde_json::from_value(self.value).map_err(|err| {
            debug!("failed to decode response payload: {err}");
            AuthError::Auth {
                status,
                message: fallback_message(status).to_string(),
            }
        })
    }
}

/// Validates and trims the configured base URL.
fn normalize_base_url(base_url: &str) -> Result<String, AuthError> {
    let trimmed = base_url.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|err| AuthError::Validation(format!("invalid base URL {trimmed:?}: {err}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AuthError::Validation(format!(
                "unsupported scheme {scheme} in base URL"
            )));
        }
    }
    if parsed.host().is_none() {
        return Err(AuthError::Validation(
            "base URL has no host specified".to_string(),
        ));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

fn map_send_error(url: &str, error: &reqwest::Error) -> AuthError {
    if error.is_timeout() {
        AuthError::Network(format!("request to {url} timed out"))
    } else if error.is_connect() {
        AuthError::Network(format!("unable to reach the server at {url}"))
    } else {
        AuthError::Network(format!("{url} - {error}"))
    }
}

/// Pulls a display message out of an error body: the JSON `message` field when
/// present, otherwise the sanitized raw body.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| sanitize_body(body))
}

fn sanitize_body(body: &str) -> String {
    body.trim().chars().take(MAX_ERROR_CHARS).collect()
}
