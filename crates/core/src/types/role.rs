//! User roles carried in bearer tokens.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A role recognised by the storefront.
///
/// The backend issues exactly two role strings. Anything else is not a
/// role as far as the storefront is concerned, so [`Role::from_claim`]
/// returns `None` and the caller routes the user to the public area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Store administrator. Lands on the admin dashboard.
    Admin,
    /// Regular customer. Lands on the client dashboard.
    User,
}

impl Role {
    /// Interpret a role claim. Matching is exact: `"admin"` is not `Admin`.
    #[must_use]
    pub fn from_claim(claim: &str) -> Option<Self> {
        match claim {
            "Admin" => Some(Self::Admin),
            "User" => Some(Self::User),
            _ => None,
        }
    }

    /// The wire representation of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::User => "User",
        }
    }

    /// Path of the dashboard this role lands on after signing in.
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::User => "/client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
