//! REST seam and the reqwest-backed production adapter.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// REST call failures.
#[derive(Debug, Error)]
pub enum RestError {
    /// Transport-level HTTP failure.
    #[error("http request failed: {reason}")]
    Http {
        /// Underlying client error.
        reason: String,
    },
    /// The endpoint answered with a non-success status.
    #[error("http status {status}")]
    Status {
        /// Response status code.
        status: u16,
    },
    /// The endpoint answered `ok: false`.
    #[error("{method} failed: {reason}")]
    Api {
        /// Method that was called.
        method: String,
        /// The `error` field of the response, or a placeholder.
        reason: String,
    },
    /// The response body was not the expected JSON.
    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    /// The configured request timeout elapsed.
    #[error("request timed out")]
    Timeout,
}

/// Dyn-safe seam over the hub's method-call HTTP API.
///
/// Implementations return the raw response envelope; the `ok` field is
/// checked by the caller via [`check_ok`].
#[async_trait]
pub trait RestClient: Send + Sync {
    /// POST `form` to `method` and return the decoded JSON body.
    async fn call(&self, method: &str, form: &[(String, String)]) -> Result<Value, RestError>;
}

/// Reject `ok: false` envelopes.
///
/// # Errors
///
/// Returns [`RestError::Api`] when the envelope carries `ok: false` or no
/// boolean `ok` at all.
pub fn check_ok(method: &str, value: Value) -> Result<Value, RestError> {
    match value.get("ok").and_then(Value::as_bool) {
        Some(true) => Ok(value),
        Some(false) => {
            let reason = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            Err(RestError::Api { method: method.to_string(), reason })
        },
        None => Err(RestError::Api {
            method: method.to_string(),
            reason: "missing ok field".to_string(),
        }),
    }
}

/// Production REST adapter backed by reqwest.
pub struct HttpRest {
    http: reqwest::Client,
    base: String,
}

impl HttpRest {
    /// Build an adapter rooted at `base` (e.g. `https://hub.example/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base: impl Into<String>) -> Result<Self, RestError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RestError::Http { reason: e.to_string() })?;
        Ok(Self { http, base: base.into() })
    }
}

#[async_trait]
impl RestClient for HttpRest {
    async fn call(&self, method: &str, form: &[(String, String)]) -> Result<Value, RestError> {
        let url = format!("{}/{method}", self.base.trim_end_matches('/'));
        tracing::debug!(%method, "rest call");

        let response = self
            .http
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| RestError::Http { reason: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RestError::Status { status: status.as_u16() });
        }

        response.json().await.map_err(|e| RestError::Http { reason: e.to_string() })
    }
}
