//! HTTP client for the platform backend.
//!
//! DESIGN
//! ======
//! `AuthApi` is the seam between the session store and the network, so the
//! store can be driven by a mock in tests. `HttpApi` is the reqwest-backed
//! implementation. There is no ambient default header: every authenticated
//! call takes the bearer token as an argument. Response parsing lives in pure
//! functions so it can be tested without a server.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{Credentials, Registration, SessionToken, TokenResponse, User};
use crate::config::{ApiConfig, TokenEncoding};

pub const TOKEN_PATH: &str = "/api/users/token";
pub const CURRENT_USER_PATH: &str = "/api/users/me";
pub const USERS_PATH: &str = "/api/users/";
pub const HEALTH_PATH: &str = "/health";

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by backend calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("request rejected: status {status}")]
    Rejected { status: u16, detail: Option<String> },

    /// A success response whose body did not have the expected shape.
    #[error("response parse failed: {0}")]
    Malformed(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Stable machine-readable code for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Rejected { .. } => "E_REJECTED",
            Self::Malformed(_) => "E_MALFORMED",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Human-readable message supplied by the backend, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// `true` for 401/403 responses.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status: 401 | 403, .. })
    }
}

// =============================================================================
// SEAM
// =============================================================================

/// Backend operations the session store depends on.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn exchange_token(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError>;

    /// Resolve the identity behind `bearer`.
    async fn current_user(&self, bearer: &SessionToken) -> Result<User, ApiError>;

    /// Create a new account. The response body is ignored.
    async fn create_user(&self, registration: &Registration) -> Result<(), ApiError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    token_encoding: TokenEncoding,
}

impl HttpApi {
    /// Build a client for `config.base_url` with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the reqwest client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            token_encoding: config.token_encoding,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /health`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or not healthy.
    pub async fn health(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .get(endpoint(&self.base_url, HEALTH_PATH))
            .send()
            .await
            .map_err(transport)?;
        read_body(response).await.map(|_| ())
    }

    /// Authenticated `GET` returning parsed JSON, for module endpoints beyond
    /// the session contract.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or a body
    /// that is not valid JSON.
    pub async fn get_json(&self, path: &str, bearer: &SessionToken) -> Result<serde_json::Value, ApiError> {
        let response = self
            .http
            .get(endpoint(&self.base_url, path))
            .bearer_auth(bearer.expose())
            .send()
            .await
            .map_err(transport)?;
        let text = read_body(response).await?;
        parse_json(&text)
    }
}

#[derive(Serialize)]
struct TokenForm<'a> {
    username: &'a str,
    password: &'a str,
}

#[async_trait::async_trait]
impl AuthApi for HttpApi {
    async fn exchange_token(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let form = TokenForm { username: &credentials.identifier, password: &credentials.secret };
        let request = self.http.post(endpoint(&self.base_url, TOKEN_PATH));
        let request = match self.token_encoding {
            TokenEncoding::Form => request.form(&form),
            TokenEncoding::Json => request.json(&form),
        };
        let response = request.send().await.map_err(transport)?;
        let text = read_body(response).await?;
        parse_token_response(&text)
    }

    async fn current_user(&self, bearer: &SessionToken) -> Result<User, ApiError> {
        let response = self
            .http
            .get(endpoint(&self.base_url, CURRENT_USER_PATH))
            .bearer_auth(bearer.expose())
            .send()
            .await
            .map_err(transport)?;
        let text = read_body(response).await?;
        parse_json(&text)
    }

    async fn create_user(&self, registration: &Registration) -> Result<(), ApiError> {
        let response = self
            .http
            .post(endpoint(&self.base_url, USERS_PATH))
            .json(registration)
            .send()
            .await
            .map_err(transport)?;
        read_body(response).await.map(|_| ())
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

fn transport(error: reqwest::Error) -> ApiError {
    ApiError::Transport(error.to_string())
}

async fn read_body(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status().as_u16();
    let text = response.text().await.map_err(transport)?;
    check_status(status, text)
}

fn check_status(status: u16, body: String) -> Result<String, ApiError> {
    if (200..300).contains(&status) {
        return Ok(body);
    }
    Err(ApiError::Rejected { status, detail: parse_detail(&body) })
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Malformed(e.to_string()))
}

fn parse_token_response(text: &str) -> Result<TokenResponse, ApiError> {
    let body: TokenResponse = parse_json(text)?;
    if body.access_token.trim().is_empty() {
        return Err(ApiError::Malformed("empty access_token".to_owned()));
    }
    Ok(body)
}

/// Extract the backend's `detail` message from an error body.
///
/// Accepts a plain string or a validation list of `{ "msg": ... }` entries.
fn parse_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                .collect();
            if messages.is_empty() { None } else { Some(messages.join("; ")) }
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
