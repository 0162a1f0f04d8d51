//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_API_URL` - Base URL of the shop backend (e.g. `https://api.example.com/api/`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `STOREFRONT_PAGE_SIZE` - Catalog page size (default: 10, max 50)
//! - `STOREFRONT_RATE_LIMIT` - Rate limit auth form posts (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::catalog::ProductFilters;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shop backend configuration
    pub backend: BackendConfig,
    /// Default catalog page size
    pub page_size: u32,
    /// Whether auth form posts are rate limited per client IP
    pub rate_limit_auth: bool,
    /// Sentry configuration
    pub sentry: SentryConfig,
}

/// Shop backend configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL every endpoint is resolved against. Always ends with `/`.
    pub api_url: Url,
    /// Timeout applied to every backend request.
    pub timeout: Duration,
}

/// Sentry error tracking configuration.
///
/// Implements `Debug` manually to redact the DSN.
#[derive(Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN; tracking is disabled when absent
    pub dsn: Option<SecretString>,
    /// Environment name reported with events
    pub environment: Option<String>,
    /// Error event sample rate
    pub sample_rate: f32,
    /// Performance trace sample rate
    pub traces_sample_rate: f32,
}

impl std::fmt::Debug for SentryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryConfig")
            .field("dsn", &self.dsn.as_ref().map(|_| "[REDACTED]"))
            .field("environment", &self.environment)
            .field("sample_rate", &self.sample_rate)
            .field("traces_sample_rate", &self.traces_sample_rate)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let backend = BackendConfig::from_env()?;

        let page_size: u32 = parse_env("STOREFRONT_PAGE_SIZE", "10")?;
        let page_size = ProductFilters::new(1, page_size)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PAGE_SIZE".to_string(), e.to_string())
            })?
            .page_size;

        let rate_limit_auth = parse_env("STOREFRONT_RATE_LIMIT", "true")?;
        let sentry = SentryConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            page_size,
            rate_limit_auth,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS (controls secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    /// Build a backend configuration from a base URL string.
    ///
    /// A trailing slash is added when missing so that relative endpoint
    /// paths such as `Auth/login` resolve underneath the base path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse or is
    /// not an absolute http(s) URL.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let invalid =
            |reason: String| ConfigError::InvalidEnvVar("STOREFRONT_API_URL".to_string(), reason);

        let mut normalized = api_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }

        let api_url = Url::parse(&normalized).map_err(|e| invalid(e.to_string()))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "unsupported scheme '{}'",
                api_url.scheme()
            )));
        }

        Ok(Self { api_url, timeout })
    }

    fn from_env() -> Result<Self, ConfigError> {
        let api_url = get_required_env("STOREFRONT_API_URL")?;
        let timeout_secs: u64 = parse_env("STOREFRONT_API_TIMEOUT_SECS", "10")?;
        Self::new(&api_url, Duration::from_secs(timeout_secs))
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN").map(SecretString::from),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_url_gets_trailing_slash() {
        let backend = BackendConfig::new("http://localhost:5000/api", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.api_url.as_str(), "http://localhost:5000/api/");
        assert_eq!(
            backend.api_url.join("Auth/login").unwrap().as_str(),
            "http://localhost:5000/api/Auth/login"
        );
    }

    #[test]
    fn test_backend_url_rejects_garbage() {
        let result = BackendConfig::new("not a url", Duration::from_secs(5));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_backend_url_rejects_other_schemes() {
        let result = BackendConfig::new("ftp://example.com/", Duration::from_secs(5));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend: BackendConfig::new("http://localhost:5000/api/", Duration::from_secs(5))
                .unwrap(),
            page_size: 10,
            rate_limit_auth: false,
            sentry: SentryConfig::default(),
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_sentry_config_debug_redacts_dsn() {
        let config = SentryConfig {
            dsn: Some(SecretString::from("https://key@o0.ingest.sentry.io/1")),
            environment: Some("staging".to_string()),
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("staging"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("ingest.sentry.io"));
    }
}
