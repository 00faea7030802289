//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `SHOP_API_BASE_URL` - REST API base, including the `/api` prefix
//!   (default: `http://127.0.0.1:8000/api`)
//! - `SHOP_TOKEN_FILE` - Where the bearer token is persisted
//!   (default: `.shop/token.json`)
//! - `SHOP_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds, 1-300 (default: 10)
//! - `SHOP_PLACEHOLDER_IMAGE_URL` - Image shown for products without one
//!   (default: `https://via.placeholder.com/150`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_TOKEN_FILE: &str = ".shop/token.json";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MAX_TIMEOUT_SECS: u64 = 300;
const DEFAULT_PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/150";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL. Always ends with `/` so relative endpoints join under it.
    pub api_base_url: Url,
    /// Path of the persisted bearer token.
    pub token_file: PathBuf,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Image URL used when a product has none.
    pub placeholder_image_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Build a configuration for the given API base URL with defaults for
    /// everything else.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if the URL does not parse or is
    /// not http(s).
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(api_base_url)?,
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            placeholder_image_url: DEFAULT_PLACEHOLDER_IMAGE_URL.to_string(),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(&get_env_or_default(
            "SHOP_API_BASE_URL",
            DEFAULT_API_BASE_URL,
        ))?;
        let token_file = PathBuf::from(get_env_or_default("SHOP_TOKEN_FILE", DEFAULT_TOKEN_FILE));
        let request_timeout = parse_timeout(&get_env_or_default(
            "SHOP_HTTP_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        ))?;
        let placeholder_image_url = get_env_or_default(
            "SHOP_PLACEHOLDER_IMAGE_URL",
            DEFAULT_PLACEHOLDER_IMAGE_URL,
        );

        Ok(Self {
            api_base_url,
            token_file,
            request_timeout,
            placeholder_image_url,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and normalize the API base URL.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(&with_slash).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl(format!("{url} cannot be a base")));
    }
    Ok(url)
}

/// Parse the request timeout in whole seconds.
fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw.trim().parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("SHOP_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
    })?;
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::InvalidEnvVar(
            "SHOP_HTTP_TIMEOUT_SECS".to_string(),
            format!("must be between 1 and {MAX_TIMEOUT_SECS} (got {secs})"),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = parse_base_url("http://localhost:8000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/");
        assert_eq!(
            url.join("products/").unwrap().as_str(),
            "http://localhost:8000/api/products/"
        );
    }

    #[test]
    fn test_base_url_keeps_existing_slash() {
        let url = parse_base_url("https://shop.example.com/api/").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/api/");
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        assert!(matches!(
            parse_base_url("ftp://shop.example.com/api"),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        assert_eq!(parse_timeout("30").unwrap(), Duration::from_secs(30));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("301").is_err());
        assert!(parse_timeout("ten").is_err());
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = ClientConfig::new("http://127.0.0.1:9000/api").unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.token_file, PathBuf::from(".shop/token.json"));
        assert!(config.sentry_dsn.is_none());
    }
}
