//! The signed-in shopper.

use idwm_core::Role;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::api::AuthData;
use crate::token::TokenPayload;

/// The authenticated identity of a browser session.
///
/// Replaced wholesale on each login and dropped on logout. The token is the
/// only part the backend cares about; everything else is for display.
#[derive(Debug, Clone)]
pub struct Identity {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Role decoded from the token at sign-in. Display only.
    pub role: Option<Role>,
    token: SecretString,
}

/// What is persisted next to the token: the identity minus the token itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl Identity {
    /// Build an identity from its parts.
    #[must_use]
    pub fn new(profile: Profile, token: impl Into<String>) -> Self {
        Self {
            email: profile.email,
            first_name: profile.first_name,
            last_name: profile.last_name,
            role: profile.role,
            token: SecretString::from(token.into()),
        }
    }

    /// Build an identity from a backend auth reply and its decoded token.
    ///
    /// Falls back to the token's `email` claim when the reply has no email.
    #[must_use]
    pub fn from_auth(auth: &AuthData, token: &str, payload: &TokenPayload) -> Self {
        let email = if auth.email.trim().is_empty() {
            payload.email().unwrap_or_default().to_string()
        } else {
            auth.email.clone()
        };

        Self::new(
            Profile {
                email,
                first_name: non_blank(auth.first_name.as_deref()),
                last_name: non_blank(auth.last_name.as_deref()),
                role: payload.role(),
            },
            token,
        )
    }

    /// Rebuild an identity from token claims alone.
    #[must_use]
    pub fn from_claims(token: &str, payload: &TokenPayload) -> Self {
        Self::new(
            Profile {
                email: payload.email().unwrap_or_default().to_string(),
                first_name: None,
                last_name: None,
                role: payload.role(),
            },
            token,
        )
    }

    /// The bearer token.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// The display profile persisted alongside the token.
    #[must_use]
    pub fn profile(&self) -> Profile {
        Profile {
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
        }
    }

    /// First name if known, otherwise the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.first_name.as_deref().unwrap_or(&self.email)
    }

    /// "First Last", or whichever half is known.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(name), None) | (None, Some(name)) => Some(name.to_string()),
            (None, None) => None,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;
    use crate::token::decode_payload;

    fn token(payload: &str) -> String {
        format!("h.{}.s", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_from_auth_prefers_reply_fields() {
        let token = token(r#"{"role":"Admin","email":"claim@example.com"}"#);
        let payload = decode_payload(&token).unwrap();
        let auth = AuthData {
            email: "ana@example.com".to_string(),
            first_name: Some("Ana".to_string()),
            last_name: Some("  ".to_string()),
            token: Some(token.clone()),
        };

        let identity = Identity::from_auth(&auth, &token, &payload);
        assert_eq!(identity.email, "ana@example.com");
        assert_eq!(identity.first_name.as_deref(), Some("Ana"));
        assert_eq!(identity.last_name, None);
        assert_eq!(identity.role, Some(Role::Admin));
        assert_eq!(identity.token(), token);
        assert_eq!(identity.display_name(), "Ana");
    }

    #[test]
    fn test_from_auth_falls_back_to_claim_email() {
        let token = token(r#"{"role":"User","email":"claim@example.com"}"#);
        let payload = decode_payload(&token).unwrap();
        let auth = AuthData {
            email: String::new(),
            first_name: None,
            last_name: None,
            token: Some(token.clone()),
        };

        let identity = Identity::from_auth(&auth, &token, &payload);
        assert_eq!(identity.email, "claim@example.com");
        assert_eq!(identity.display_name(), "claim@example.com");
        assert_eq!(identity.full_name(), None);
    }

    #[test]
    fn test_profile_excludes_token() {
        let identity = Identity::new(
            Profile {
                email: "ana@example.com".to_string(),
                first_name: Some("Ana".to_string()),
                last_name: Some("Rojas".to_string()),
                role: Some(Role::User),
            },
            "secret.token.value",
        );

        let json = serde_json::to_string(&identity.profile()).unwrap();
        assert!(!json.contains("secret.token.value"));
        assert_eq!(identity.full_name().as_deref(), Some("Ana Rojas"));
        assert!(!format!("{identity:?}").contains("secret.token.value"));
    }
}
