//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog page shell
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Catalog page shell
//! GET  /products/grid          - Product grid fragment (HTMX, fetches)
//! GET  /products/{id}          - Product detail overlay (HTMX)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns badge, triggers cart-updated)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Dashboards (role-gated)
//! GET  /admin                  - Admin dashboard
//! GET  /client                 - Client dashboard
//!
//! # API
//! GET  /api/me                 - Current identity (JSON)
//! ```

pub mod api;
pub mod auth;
pub mod cart;
pub mod dashboard;
pub mod nav;
pub mod products;

use axum::{
    Router,
    routing::{MethodRouter, get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
///
/// Form posts are rate limited per client IP when `rate_limit` is set.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let limited = |route: MethodRouter<AppState>| {
        if rate_limit {
            route.layer(auth_rate_limiter())
        } else {
            route
        }
    };

    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(limited(post(auth::login))),
        )
        .route(
            "/register",
            get(auth::register_page).merge(limited(post(auth::register))),
        )
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/grid", get(products::grid))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/count", get(cart::count))
}

/// Create the dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard::admin))
        .route("/client", get(dashboard::client))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/me", get(api::me))
}

/// Create all routes for the storefront.
pub fn routes(rate_limit_auth: bool) -> Router<AppState> {
    Router::new()
        // Catalog doubles as the landing page
        .route("/", get(products::index))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes(rate_limit_auth))
        .merge(dashboard_routes())
        .nest("/api", api_routes())
}
