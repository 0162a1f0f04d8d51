//! Catalog route handlers.
//!
//! The page shell renders immediately with a loading placeholder and a fresh
//! view id; HTMX then requests the grid fragment, which is where the backend
//! fetch happens. Fragment requests carry the view id back so each tab keeps
//! its own page. A grid request superseded by a newer one for the same view
//! answers `204 No Content` so HTMX leaves the page alone.

use std::sync::PoisonError;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use idwm_core::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::api::{ApiError, Product};
use crate::catalog::{CatalogView, Completion, ProductFilters, SharedView, ViewKey};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalIdentity;
use crate::models::session_keys;
use crate::routes::nav::Nav;
use crate::state::AppState;

/// Image shown when a product has no usable image URL.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.svg";

/// Alt text for products without a name.
pub const UNNAMED_PRODUCT: &str = "Unnamed product";

const NO_PRODUCTS_MESSAGE: &str = "No products found.";

// =============================================================================
// Query Types
// =============================================================================

/// Paging query for the catalog page and grid.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// View id minted by the page shell.
    pub view: Option<Uuid>,
}

/// Identifies the catalog page a fragment request comes from.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub view: Option<Uuid>,
}

// =============================================================================
// View Models
// =============================================================================

/// A product prepared for display.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub image: String,
    pub description: Option<String>,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        let image = product
            .urls
            .iter()
            .map(|url| url.trim())
            .find(|url| !url.is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE)
            .to_string();

        let name = product.name.trim();
        Self {
            id: product.id,
            name: if name.is_empty() {
                UNNAMED_PRODUCT.to_string()
            } else {
                name.to_string()
            },
            price: product.price.display(),
            image,
            description: product
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Catalog page shell.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct CatalogPageTemplate {
    pub nav: Nav,
    pub page: u32,
    pub size: u32,
    pub view: Uuid,
}

/// Product grid fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate {
    pub view: Uuid,
    pub products: Vec<ProductCard>,
    pub error: Option<String>,
    pub empty: bool,
    pub page: u32,
    pub size: u32,
    pub previous_page: Option<u32>,
    pub next_page: Option<u32>,
}

impl ProductGridTemplate {
    fn from_view(key: ViewKey, view: &CatalogView) -> Self {
        let filters = view.filters();
        let products: Vec<ProductCard> = view.products().iter().map(ProductCard::from).collect();
        // A full page suggests there may be more
        let has_more = view.error().is_none()
            && u32::try_from(products.len()).is_ok_and(|n| n >= filters.page_size);

        Self {
            view: key.page,
            error: view.error().map(String::from),
            empty: view.is_empty_page(),
            page: filters.page_number,
            size: filters.page_size,
            previous_page: filters.previous().map(|f| f.page_number),
            next_page: has_more.then(|| filters.next().page_number),
            products,
        }
    }
}

/// Product detail overlay fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_detail.html")]
pub struct ProductDetailTemplate {
    pub view: Uuid,
    pub product: ProductCard,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display the catalog page shell.
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalIdentity(identity): OptionalIdentity,
    Query(query): Query<CatalogQuery>,
) -> Result<CatalogPageTemplate, AppError> {
    let filters = ProductFilters::clamped(query.page, query.size, state.config().page_size);
    // The owner id must exist before the tab's fragments race for it
    owner_id(&session).await?;

    Ok(CatalogPageTemplate {
        nav: Nav::load(&session, identity.as_ref()).await,
        page: filters.page_number,
        size: filters.page_size,
        view: Uuid::new_v4(),
    })
}

/// Fetch one page and render the grid fragment.
#[instrument(skip(state, session))]
pub async fn grid(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CatalogQuery>,
) -> Result<Response, AppError> {
    let filters = ProductFilters::clamped(query.page, query.size, state.config().page_size);
    let key = ViewKey::new(owner_id(&session).await?, query.view);
    let view = state.catalog_views().get_or_create(key).await;

    let ticket = lock(&view).begin(filters);
    add_breadcrumb(
        "catalog",
        "Fetching products",
        Some(&[("page", &ticket.filters().page_number.to_string())]),
    );

    let result = state
        .api()
        .fetch_products(ticket.filters())
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "Product fetch failed");
            match err {
                ApiError::MissingData(_) => NO_PRODUCTS_MESSAGE.to_string(),
                other => other.user_message(),
            }
        });

    let mut guard = lock(&view);
    if guard.complete(&ticket, result) == Completion::Stale {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let template = ProductGridTemplate::from_view(key, &guard);
    drop(guard);

    Ok(template.into_response())
}

/// Render the detail overlay for a product on the current page.
///
/// Served from the catalog view without contacting the backend.
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Query(query): Query<ViewQuery>,
) -> Result<ProductDetailTemplate, AppError> {
    let product = find_on_page(&state, &session, query.view, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    add_breadcrumb(
        "catalog",
        "Opened product",
        Some(&[("product_id", &id.to_string())]),
    );
    Ok(ProductDetailTemplate {
        view: query.view.unwrap_or_default(),
        product: ProductCard::from(&product),
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

fn lock(view: &SharedView) -> std::sync::MutexGuard<'_, CatalogView> {
    view.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The id that scopes this browser's catalog views, created on first use.
async fn owner_id(session: &Session) -> Result<Uuid, AppError> {
    if let Some(id) = session.get::<Uuid>(session_keys::CATALOG_VIEW).await? {
        return Ok(id);
    }
    let id = Uuid::new_v4();
    session.insert(session_keys::CATALOG_VIEW, id).await?;
    Ok(id)
}

/// Look up a product on the page `view` currently shows.
pub async fn find_on_page(
    state: &AppState,
    session: &Session,
    view: Option<Uuid>,
    id: ProductId,
) -> Result<Option<Product>, AppError> {
    let Some(owner) = session.get::<Uuid>(session_keys::CATALOG_VIEW).await? else {
        return Ok(None);
    };
    let Some(view) = state.catalog_views().get(ViewKey::new(owner, view)).await else {
        return Ok(None);
    };

    let product = lock(&view).product(id).cloned();
    Ok(product)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idwm_core::Price;
    use rust_decimal::Decimal;

    use super::*;

    fn key() -> ViewKey {
        ViewKey::new(Uuid::new_v4(), Some(Uuid::new_v4()))
    }

    fn product(name: &str, urls: &[&str]) -> Product {
        Product {
            id: ProductId::new(5),
            name: name.to_string(),
            price: Price::new(Decimal::new(1999, 2)).unwrap(),
            description: Some("  ".to_string()),
            urls: urls.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_card_uses_first_non_blank_image() {
        let card = ProductCard::from(&product("Mug", &["", "  ", "https://img.example/mug.png"]));
        assert_eq!(card.image, "https://img.example/mug.png");
        assert_eq!(card.price, "$19.99");
        assert!(card.description.is_none());
    }

    #[test]
    fn test_card_placeholders() {
        let card = ProductCard::from(&product("   ", &[]));
        assert_eq!(card.image, PLACEHOLDER_IMAGE);
        assert_eq!(card.name, UNNAMED_PRODUCT);
    }

    #[test]
    fn test_grid_paging_links() {
        let mut view = CatalogView::new();
        let ticket = view.begin(ProductFilters::new(2, 1).unwrap());
        view.complete(&ticket, Ok(vec![product("Mug", &[])]));

        let grid = ProductGridTemplate::from_view(key(), &view);
        assert_eq!(grid.previous_page, Some(1));
        assert_eq!(grid.next_page, Some(3));
        assert!(!grid.empty);
    }

    #[test]
    fn test_grid_empty_page() {
        let mut view = CatalogView::new();
        let ticket = view.begin(ProductFilters::default());
        view.complete(&ticket, Ok(Vec::new()));

        let grid = ProductGridTemplate::from_view(key(), &view);
        assert!(grid.empty);
        assert!(grid.products.is_empty());
        assert!(grid.next_page.is_none());
        let html = grid.render().unwrap();
        assert!(html.contains("No products to show yet."));
    }

    #[test]
    fn test_grid_failure_keeps_last_page() {
        let mut view = CatalogView::new();
        let ticket = view.begin(ProductFilters::default());
        view.complete(&ticket, Ok(vec![product("Mug", &[])]));
        let retry = view.begin(ProductFilters::default());
        view.complete(&retry, Err("Could not reach the server. Please try again.".to_string()));

        let key = key();
        let html = ProductGridTemplate::from_view(key, &view).render().unwrap();
        assert!(html.contains("Could not reach the server. Please try again."));
        assert!(html.contains(&format!("size=10&amp;view={}\"", key.page)));
        assert!(html.contains("Mug"));
    }
}
