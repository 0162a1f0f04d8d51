//! Session keys.
//!
//! Every value the storefront keeps per browser lives under one of these keys
//! in the tower-sessions record.

/// Session keys for per-browser state.
pub mod keys {
    /// Raw bearer token issued by the backend.
    pub const TOKEN: &str = "token";

    /// Display profile (identity without the token).
    pub const PROFILE: &str = "profile";

    /// Cart lines.
    pub const CART: &str = "cart";

    /// Id scoping this browser's catalog views in the view registry.
    pub const CATALOG_VIEW: &str = "catalog_view";
}
