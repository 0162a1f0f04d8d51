//! Navigation bar context shared by every full-page template.

use idwm_core::Role;
use tower_sessions::Session;

use crate::models::{Cart, Identity, session_keys};

/// What the navigation bar needs to render.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    /// First name, or email when no name is known.
    pub user_name: Option<String>,
    pub role: Option<Role>,
    /// Total quantity in the cart. The badge is hidden when zero.
    pub cart_count: u32,
}

impl Nav {
    /// Build the navigation context for a request.
    pub async fn load(session: &Session, identity: Option<&Identity>) -> Self {
        Self {
            user_name: identity.map(|i| i.display_name().to_string()),
            role: identity.and_then(|i| i.role),
            cart_count: load_cart(session).await.total_quantity(),
        }
    }

    /// Count shown on the cart badge.
    #[must_use]
    pub const fn badge_count(&self) -> u32 {
        self.cart_count
    }

    /// Dashboard link for the signed-in role.
    #[must_use]
    pub fn dashboard_path(&self) -> Option<&'static str> {
        self.role.map(Role::home_path)
    }
}

/// The session's cart, or an empty cart when none is stored or it cannot be
/// read.
pub async fn load_cart(session: &Session) -> Cart {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read cart from session");
            Cart::default()
        }
    }
}
