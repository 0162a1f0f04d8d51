//! Login and registration form validation.
//!
//! Validation runs before any backend call. A form that fails validation is
//! re-rendered with one message per offending field and the backend is never
//! contacted.

use std::sync::LazyLock;

use idwm_core::{Email, EmailError};
use regex::Regex;
use secrecy::SecretString;
use serde::Deserialize;

use crate::api::{Credentials, Registration};

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{9,15}$").expect("Invalid regex"));

const NAME_MAX: usize = 50;
const EMAIL_MAX: usize = 100;
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 100;

// =============================================================================
// Field Errors
// =============================================================================

/// Validation messages keyed by form field name.
///
/// Only the first failing rule per field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(&'static str, String)>,
}

impl FieldErrors {
    /// Record `message` for `field` unless the field already has one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.entries.push((field, message.into()));
        }
    }

    /// The message for `field`, if it failed validation.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Login
// =============================================================================

/// Raw login form submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// Validate the submission.
    ///
    /// # Errors
    ///
    /// Returns the field errors when any rule fails.
    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::default();

        let email = validate_email(&self.email, usize::MAX, &mut errors);
        if self.password.is_empty() {
            errors.add("password", "Password is required.");
        }

        match email {
            Some(email) if errors.is_empty() => Ok(Credentials {
                email,
                password: SecretString::from(self.password.clone()),
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Register
// =============================================================================

/// Raw registration form submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl RegisterForm {
    /// Validate the submission.
    ///
    /// A mismatched confirmation is reported on `confirm_password`.
    ///
    /// # Errors
    ///
    /// Returns the field errors when any rule fails.
    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::default();

        let first_name = validate_name("first_name", "First name", &self.first_name, &mut errors);
        let last_name = validate_name("last_name", "Last name", &self.last_name, &mut errors);
        let email = validate_email(&self.email, EMAIL_MAX, &mut errors);

        let phone = self.phone.trim();
        if phone.is_empty() {
            errors.add("phone", "Phone is required.");
        } else if !PHONE_RE.is_match(phone) {
            errors.add(
                "phone",
                "Phone must be 9 to 15 digits, optionally starting with +.",
            );
        }

        let password_len = self.password.chars().count();
        if password_len == 0 {
            errors.add("password", "Password is required.");
        } else if password_len < PASSWORD_MIN {
            errors.add(
                "password",
                format!("Password must be at least {PASSWORD_MIN} characters."),
            );
        } else if password_len > PASSWORD_MAX {
            errors.add(
                "password",
                format!("Password must be at most {PASSWORD_MAX} characters."),
            );
        }

        if self.confirm_password.is_empty() {
            errors.add("confirm_password", "Please confirm your password.");
        } else if self.confirm_password != self.password {
            errors.add("confirm_password", "Passwords do not match.");
        }

        match email {
            Some(email) if errors.is_empty() => Ok(Registration {
                first_name,
                last_name,
                email,
                phone: phone.to_string(),
                password: SecretString::from(self.password.clone()),
                confirm_password: SecretString::from(self.confirm_password.clone()),
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn validate_email(raw: &str, max: usize, errors: &mut FieldErrors) -> Option<Email> {
    let trimmed = raw.trim();
    if trimmed.chars().count() > max {
        errors.add("email", format!("Email must be at most {max} characters."));
        return None;
    }

    match Email::parse(trimmed) {
        Ok(email) => Some(email),
        Err(EmailError::Empty) => {
            errors.add("email", "Email is required.");
            None
        }
        Err(_) => {
            errors.add("email", "Enter a valid email address.");
            None
        }
    }
}

fn validate_name(
    field: &'static str,
    label: &str,
    raw: &str,
    errors: &mut FieldErrors,
) -> String {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        errors.add(field, format!("{label} is required."));
    } else if len > NAME_MAX {
        errors.add(field, format!("{label} must be at most {NAME_MAX} characters."));
    }
    trimmed.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn valid_registration() -> RegisterForm {
        RegisterForm {
            first_name: "Ana".to_string(),
            last_name: "Rojas".to_string(),
            email: "ana@example.com".to_string(),
            phone: "+56912345678".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        }
    }

    #[test]
    fn test_login_requires_both_fields() {
        let errors = LoginForm::default().validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is required."));
        assert_eq!(errors.get("password"), Some("Password is required."));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_login_rejects_malformed_email() {
        let form = LoginForm {
            email: "ana-at-example".to_string(),
            password: "x".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Enter a valid email address."));
        assert_eq!(errors.get("password"), None);
    }

    #[test]
    fn test_login_valid() {
        let form = LoginForm {
            email: " ana@example.com ".to_string(),
            password: "pw".to_string(),
        };
        let credentials = form.validate().unwrap();
        assert_eq!(credentials.email.as_str(), "ana@example.com");
        assert_eq!(credentials.password.expose_secret(), "pw");
    }

    #[test]
    fn test_register_valid() {
        let registration = valid_registration().validate().unwrap();
        assert_eq!(registration.first_name, "Ana");
        assert_eq!(registration.phone, "+56912345678");
    }

    #[test]
    fn test_register_password_mismatch_reported_on_confirmation() {
        let form = RegisterForm {
            confirm_password: "different".to_string(),
            ..valid_registration()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("confirm_password"), Some("Passwords do not match."));
        assert_eq!(errors.get("password"), None);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_register_phone_rules() {
        for phone in ["12345678", "+1234567890123456", "56 9 1234 5678", "abc123456789"] {
            let form = RegisterForm {
                phone: phone.to_string(),
                ..valid_registration()
            };
            assert!(form.validate().unwrap_err().get("phone").is_some(), "{phone}");
        }
        for phone in ["123456789", "+123456789012345"] {
            let form = RegisterForm {
                phone: phone.to_string(),
                ..valid_registration()
            };
            assert!(form.validate().is_ok(), "{phone}");
        }
    }

    #[test]
    fn test_register_length_limits() {
        let form = RegisterForm {
            first_name: "a".repeat(51),
            last_name: "  ".to_string(),
            email: format!("{}@example.com", "a".repeat(90)),
            password: "12345".to_string(),
            confirm_password: "12345".to_string(),
            ..valid_registration()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("first_name"),
            Some("First name must be at most 50 characters.")
        );
        assert_eq!(errors.get("last_name"), Some("Last name is required."));
        assert_eq!(
            errors.get("email"),
            Some("Email must be at most 100 characters.")
        );
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters.")
        );
    }

    #[test]
    fn test_field_errors_keep_first_message() {
        let mut errors = FieldErrors::default();
        errors.add("email", "first");
        errors.add("email", "second");
        assert_eq!(errors.get("email"), Some("first"));
        assert_eq!(errors.len(), 1);
    }
}
