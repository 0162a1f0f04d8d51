//! Bearer token payload decoding.
//!
//! The backend issues JWTs. The storefront only reads the payload to decide
//! which dashboard to show; the signature is never verified here and nothing
//! decoded from a token is trusted for authorization. The backend re-checks
//! every request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use idwm_core::Role;
use serde_json::{Map, Value};
use thiserror::Error;

/// Claim name used by ASP.NET Core for roles.
pub const DOTNET_ROLE_CLAIM: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

/// Errors from [`decode_payload`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,
    #[error("token must have 3 segments, found {0}")]
    SegmentCount(usize),
    #[error("payload is not valid base64url")]
    Base64,
    #[error("payload is not valid JSON: {0}")]
    Json(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Decoded claims of a bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPayload {
    claims: Map<String, Value>,
}

impl TokenPayload {
    /// The recognised role, if the token carries one.
    ///
    /// Looks at `role` first and then at the .NET role claim URI. When the
    /// claim is an array the first recognised entry wins.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        ["role", DOTNET_ROLE_CLAIM]
            .iter()
            .filter_map(|key| self.claims.get(*key))
            .find_map(role_from_value)
    }

    /// The `email` claim.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.str_claim("email")
    }

    /// Expiry from the `exp` claim. Informational only; not enforced.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.claims.get("exp")?.as_i64()?;
        DateTime::from_timestamp(exp, 0)
    }

    fn str_claim(&self, name: &str) -> Option<&str> {
        self.claims
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

fn role_from_value(value: &Value) -> Option<Role> {
    match value {
        Value::String(s) => Role::from_claim(s),
        Value::Array(items) => items.iter().find_map(role_from_value),
        _ => None,
    }
}

/// Decode the payload segment of a bearer token.
///
/// Accepts base64url with or without padding. Never panics.
///
/// # Errors
///
/// Returns a [`TokenError`] when the token is empty, does not have exactly
/// three segments, or its payload is not a base64url-encoded JSON object.
pub fn decode_payload(token: &str) -> Result<TokenPayload, TokenError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Empty);
    }

    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(TokenError::SegmentCount(segments.len()));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TokenError::Base64)?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(claims)) => Ok(TokenPayload { claims }),
        Ok(_) => Err(TokenError::NotAnObject),
        Err(e) => Err(TokenError::Json(e.to_string())),
    }
}

/// Role carried by a token, treating any decode failure as "no role".
#[must_use]
pub fn role_of(token: &str) -> Option<Role> {
    decode_payload(token).ok().and_then(|payload| payload.role())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!("header.{}.signature", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_decodes_role_claim() {
        let token = token_with(r#"{"role":"Admin","email":"ana@example.com"}"#);
        let payload = decode_payload(&token).unwrap();
        assert_eq!(payload.role(), Some(Role::Admin));
        assert_eq!(payload.email(), Some("ana@example.com"));
    }

    #[test]
    fn test_decodes_dotnet_role_claim() {
        let token = token_with(&format!(r#"{{"{DOTNET_ROLE_CLAIM}":"User"}}"#));
        assert_eq!(role_of(&token), Some(Role::User));
    }

    #[test]
    fn test_role_array_uses_first_recognised() {
        let token = token_with(r#"{"role":["Guest","User"]}"#);
        assert_eq!(role_of(&token), Some(Role::User));
    }

    #[test]
    fn test_unknown_or_missing_role() {
        assert_eq!(role_of(&token_with(r#"{"role":"Superuser"}"#)), None);
        assert_eq!(role_of(&token_with(r#"{"role":"admin"}"#)), None);
        assert_eq!(role_of(&token_with(r#"{"sub":"42"}"#)), None);
    }

    #[test]
    fn test_padding_tolerated() {
        let encoded = base64::engine::general_purpose::URL_SAFE.encode(r#"{"role": "User"}"#);
        assert!(encoded.ends_with('='));
        let token = format!("h.{encoded}.s");
        assert_eq!(role_of(&token), Some(Role::User));
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(decode_payload(""), Err(TokenError::Empty));
        assert_eq!(decode_payload("   "), Err(TokenError::Empty));
        assert_eq!(decode_payload("only-one"), Err(TokenError::SegmentCount(1)));
        assert_eq!(decode_payload("a.b.c.d"), Err(TokenError::SegmentCount(4)));
        assert_eq!(decode_payload("a.!!!.c"), Err(TokenError::Base64));
        assert!(matches!(
            decode_payload(&token_with("not json")),
            Err(TokenError::Json(_))
        ));
        assert_eq!(
            decode_payload(&token_with("[1,2,3]")),
            Err(TokenError::NotAnObject)
        );
        assert_eq!(role_of("garbage"), None);
    }

    #[test]
    fn test_expiry() {
        let payload = decode_payload(&token_with(r#"{"sub":"7","exp":1700000000}"#)).unwrap();
        assert_eq!(payload.expires_at().unwrap().timestamp(), 1_700_000_000);

        let payload = decode_payload(&token_with(r#"{"exp":"soon"}"#)).unwrap();
        assert!(payload.expires_at().is_none());
    }
}
