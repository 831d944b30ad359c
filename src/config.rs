//! Client configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const TOKEN_FILE_NAME: &str = "token";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
}

/// How the token exchange encodes `username` / `password`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenEncoding {
    /// `application/x-www-form-urlencoded`, the OAuth2 password-grant shape.
    #[default]
    Form,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub token_encoding: TokenEncoding,
    pub timeouts: Timeouts,
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            token_encoding: TokenEncoding::default(),
            timeouts: Timeouts::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub api: ApiConfig,
    pub token_path: PathBuf,
}

impl PortalConfig {
    /// Build typed config from the process environment.
    ///
    /// Optional:
    /// - `PORTAL_API_URL`: backend base URL, default `http://127.0.0.1:8000`
    /// - `PORTAL_TOKEN_FILE`: token location, default `$XDG_CONFIG_HOME/portal/token`
    /// - `PORTAL_TOKEN_ENCODING`: `form` (default) or `json`
    /// - `PORTAL_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PORTAL_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if `PORTAL_TOKEN_ENCODING` names an unknown encoding.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PortalConfig::from_env`] but reads variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORTAL_TOKEN_ENCODING` names an unknown encoding.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("PORTAL_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let token_encoding = parse_token_encoding(lookup("PORTAL_TOKEN_ENCODING").as_deref())?;
        let timeouts = Timeouts {
            request_secs: parse_u64(lookup("PORTAL_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("PORTAL_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let token_path = lookup("PORTAL_TOKEN_FILE")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| default_token_path(&lookup), PathBuf::from);

        let mut api = ApiConfig::new(base_url.trim());
        api.token_encoding = token_encoding;
        api.timeouts = timeouts;
        Ok(Self { api, token_path })
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_token_encoding(raw: Option<&str>) -> Result<TokenEncoding, ConfigError> {
    match raw.map(str::trim).unwrap_or("form") {
        "form" | "" => Ok(TokenEncoding::Form),
        "json" => Ok(TokenEncoding::Json),
        other => Err(ConfigError::Parse(format!(
            "unsupported PORTAL_TOKEN_ENCODING '{other}' (expected 'form' or 'json')"
        ))),
    }
}

fn default_token_path(lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(xdg) = lookup("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join("portal").join(TOKEN_FILE_NAME);
    }
    if let Some(home) = lookup("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".config").join("portal").join(TOKEN_FILE_NAME);
    }
    PathBuf::from(".portal").join(TOKEN_FILE_NAME)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
