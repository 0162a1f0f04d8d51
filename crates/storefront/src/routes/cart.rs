//! Cart route handlers.
//!
//! The cart is held in the session. Adding a product copies its name and price
//! from the catalog page the shopper is looking at; the backend is not asked
//! again.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderName,
    response::{IntoResponse, Response},
};
use idwm_core::{Price, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalIdentity;
use crate::models::{CartLine, session_keys};
use crate::routes::nav::{Nav, load_cart};
use crate::routes::products::find_on_page;
use crate::state::AppState;

/// Event HTMX listens for to refresh cart badges.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Shown in place of a total that does not fit a price.
const OVERSIZED_TOTAL: &str = "Too large";

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    /// Catalog page the product was picked from.
    pub view: Option<Uuid>,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nav: Nav,
    pub empty: bool,
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
}

/// Cart count badge fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// A cart line prepared for display.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.display(),
            line_total: display_total(line.line_total()),
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display the cart page.
pub async fn show(
    session: Session,
    OptionalIdentity(identity): OptionalIdentity,
) -> impl IntoResponse {
    let cart = load_cart(&session).await;
    CartShowTemplate {
        nav: Nav::load(&session, identity.as_ref()).await,
        empty: cart.is_empty(),
        lines: cart.lines.iter().map(CartLineView::from).collect(),
        subtotal: display_total(cart.subtotal()),
    }
}

/// Add one unit of a product from the current catalog page.
///
/// Returns the updated badge and fires `cart-updated` for any other badge on
/// the page.
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let product = find_on_page(&state, &session, form.view, form.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let mut cart = load_cart(&session).await;
    cart.add(&product)?;
    session.insert(session_keys::CART, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", &product.id.to_string())]),
    );
    tracing::debug!(product_id = %product.id, total = cart.total_quantity(), "Cart updated");

    Ok((
        [(HeaderName::from_static("hx-trigger"), CART_UPDATED_EVENT)],
        CartCountTemplate {
            count: cart.total_quantity(),
        },
    )
        .into_response())
}

/// Get the cart count badge (HTMX fragment).
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: load_cart(&session).await.total_quantity(),
    }
}

fn display_total(total: Option<Price>) -> String {
    total.map_or_else(|| OVERSIZED_TOTAL.to_string(), |price| price.display())
}
