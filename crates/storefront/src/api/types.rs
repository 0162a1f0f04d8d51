//! Wire types for the shop backend.
//!
//! Every backend response is wrapped in the same envelope:
//!
//! ```json
//! { "success": true, "message": "...", "data": { ... }, "errors": null }
//! ```

use idwm_core::{Email, Price, ProductId};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// The uniform `{success, message, data, errors}` response wrapper.
///
/// `data` is kept as raw JSON because its shape depends on the endpoint and
/// a malformed `data` must be reported differently from a malformed envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    /// Explicit success flag. A missing flag counts as failure.
    #[serde(default)]
    pub success: bool,
    /// Human-readable message, mostly present on failure.
    #[serde(default)]
    pub message: Option<String>,
    /// Endpoint-specific payload.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Validation details reported by the backend.
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

/// Account data returned by `Auth/login` and `Auth/register`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// A catalog product as served by `GET Product`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub description: Option<String>,
    /// Image URLs, in display order.
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Validated login input.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_missing_success_is_failure() {
        let envelope: Envelope = serde_json::from_str(r#"{"message":"nope"}"#).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("nope"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_auth_data_camel_case() {
        let data: AuthData = serde_json::from_str(
            r#"{"email":"ana@example.com","firstName":"Ana","lastName":"Rojas","token":"a.b.c"}"#,
        )
        .unwrap();
        assert_eq!(data.first_name.as_deref(), Some("Ana"));
        assert_eq!(data.last_name.as_deref(), Some("Rojas"));
        assert_eq!(data.token.as_deref(), Some("a.b.c"));
    }

    #[test]
    fn test_product_optional_fields() {
        let product: Product =
            serde_json::from_str(r#"{"id":3,"name":"Mug","price":4990}"#).unwrap();
        assert_eq!(product.id, ProductId::new(3));
        assert!(product.description.is_none());
        assert!(product.urls.is_empty());
        assert_eq!(product.price.display(), "$4990.00");
    }
}
