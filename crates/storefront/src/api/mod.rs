//! Client for the shop backend REST API.
//!
//! # Endpoints
//!
//! - `POST Auth/login` - exchange credentials for a bearer token
//! - `POST Auth/register` - create an account (token optional in the reply)
//! - `GET Product?PageNumber=&PageSize=` - one page of the catalog
//!
//! All replies use the [`Envelope`] wrapper. A reply with `success: false`
//! (or a non-2xx status carrying an envelope) becomes
//! [`ApiError::Rejected`] so the caller can show the backend's own message.
//!
//! The backend re-checks every role server-side; nothing this client decodes
//! from a token is treated as an authorization decision.

pub mod types;

use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::catalog::ProductFilters;
use crate::config::BackendConfig;

pub use types::{AuthData, Credentials, Envelope, Product, Registration};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connection refused, timeout, TLS, etc.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an explicit failure.
    #[error("backend rejected the request: {}", .message.as_deref().unwrap_or("(no message)"))]
    Rejected {
        /// Message supplied by the backend, if any.
        message: Option<String>,
    },

    /// Non-success status without a readable envelope.
    #[error("backend returned HTTP {0}")]
    Status(u16),

    /// The envelope or its payload could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The envelope reported success but lacked a required payload.
    #[error("response is missing {0}")]
    MissingData(&'static str),

    /// An endpoint path could not be resolved against the base URL.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Message safe to show to a shopper.
    ///
    /// Backend-supplied messages are passed through as-is; everything else
    /// collapses to a generic sentence.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message: Some(m) } if !m.trim().is_empty() => m.clone(),
            Self::Rejected { .. } => "The server rejected the request.".to_string(),
            Self::Http(_) => "Could not reach the server. Please try again.".to_string(),
            Self::Status(status) => {
                format!("The server returned an unexpected error (HTTP {status}).")
            }
            Self::Parse(_) | Self::MissingData(_) => {
                "The server sent an unexpected response.".to_string()
            }
            Self::InvalidUrl(_) => "The storefront is misconfigured.".to_string(),
        }
    }

    /// Whether the failure came from the backend's answer rather than from
    /// the network or the storefront itself.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Status(_))
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the shop backend.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request and unwrap the envelope.
    ///
    /// Returns the envelope only when the status is 2xx and `success` is true.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Envelope, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Rejections usually still carry an envelope with a message.
            return match serde_json::from_str::<Envelope>(&body) {
                Ok(envelope) if envelope.message.is_some() => {
                    tracing::info!(status = %status, message = ?envelope.message, "Backend rejected request");
                    Err(ApiError::Rejected {
                        message: envelope.message,
                    })
                }
                _ => {
                    tracing::warn!(
                        status = %status,
                        body = %body.chars().take(200).collect::<String>(),
                        "Backend returned non-success status"
                    );
                    Err(ApiError::Status(status.as_u16()))
                }
            };
        }

        let envelope: Envelope = serde_json::from_str(&body).inspect_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend envelope"
            );
        })?;

        if !envelope.success {
            tracing::info!(message = ?envelope.message, "Backend reported failure");
            return Err(ApiError::Rejected {
                message: envelope.message,
            });
        }

        Ok(envelope)
    }

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` for bad credentials,
    /// `ApiError::MissingData` if the reply has no token, and transport or
    /// parse errors otherwise.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthData, ApiError> {
        let body = serde_json::json!({
            "email": credentials.email.as_str(),
            "password": credentials.password.expose_secret(),
        });

        let request = self.inner.client.post(self.endpoint("Auth/login")?).json(&body);
        let envelope = self.execute(request).await?;

        let data = envelope.data.ok_or(ApiError::MissingData("data"))?;
        let auth: AuthData = serde_json::from_value(data)?;
        if auth.token.as_deref().is_none_or(str::is_empty) {
            return Err(ApiError::MissingData("token"));
        }

        tracing::debug!("Login accepted by backend");
        Ok(auth)
    }

    /// Create an account.
    ///
    /// Returns `Ok(None)` when the backend accepted the registration without
    /// returning account data; the shopper then signs in separately.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` when the backend refuses the
    /// registration, and transport or parse errors otherwise.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<Option<AuthData>, ApiError> {
        let body = serde_json::json!({
            "firstName": registration.first_name,
            "lastName": registration.last_name,
            "email": registration.email.as_str(),
            "phone": registration.phone,
            "password": registration.password.expose_secret(),
            "confirmPassword": registration.confirm_password.expose_secret(),
        });

        let request = self
            .inner
            .client
            .post(self.endpoint("Auth/register")?)
            .json(&body);
        let envelope = self.execute(request).await?;

        match envelope.data {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(data) => Ok(Some(serde_json::from_value(data)?)),
        }
    }

    /// Fetch one page of products.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MissingData` when `data` is absent or not an array,
    /// `ApiError::Rejected` on `success: false`, and transport or parse
    /// errors otherwise.
    #[instrument(skip(self), fields(page = filters.page_number, size = filters.page_size))]
    pub async fn fetch_products(&self, filters: &ProductFilters) -> Result<Vec<Product>, ApiError> {
        let mut url = self.endpoint("Product")?;
        url.query_pairs_mut()
            .append_pair("PageNumber", &filters.page_number.to_string())
            .append_pair("PageSize", &filters.page_size.to_string());

        let envelope = self.execute(self.inner.client.get(url)).await?;

        if let Some(errors) = envelope.errors.as_ref().filter(|e| !e.is_null()) {
            tracing::warn!(errors = %errors, "Backend reported errors alongside products");
        }

        match envelope.data {
            Some(data @ serde_json::Value::Array(_)) => {
                let products: Vec<Product> = serde_json::from_value(data)?;
                tracing::debug!(count = products.len(), "Fetched products");
                Ok(products)
            }
            _ => Err(ApiError::MissingData("a product list")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_passthrough() {
        let err = ApiError::Rejected {
            message: Some("Credenciales inválidas".to_string()),
        };
        assert_eq!(err.user_message(), "Credenciales inválidas");
        assert!(err.is_rejection());
    }

    #[test]
    fn test_rejected_without_message_uses_fallback() {
        let err = ApiError::Rejected { message: None };
        assert_eq!(err.user_message(), "The server rejected the request.");

        let err = ApiError::Rejected {
            message: Some("   ".to_string()),
        };
        assert_eq!(err.user_message(), "The server rejected the request.");
    }

    #[test]
    fn test_status_and_missing_data_messages() {
        assert_eq!(
            ApiError::Status(502).user_message(),
            "The server returned an unexpected error (HTTP 502)."
        );
        assert_eq!(
            ApiError::MissingData("token").user_message(),
            "The server sent an unexpected response."
        );
        assert!(!ApiError::MissingData("token").is_rejection());
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Rejected {
            message: Some("bad".to_string()),
        };
        assert_eq!(err.to_string(), "backend rejected the request: bad");
        assert_eq!(
            ApiError::MissingData("token").to_string(),
            "response is missing token"
        );
    }
}
