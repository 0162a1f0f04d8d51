//! Role-gated dashboards.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tower_sessions::Session;

use crate::filters;
use crate::middleware::{RequireAdmin, RequireClient};
use crate::routes::nav::Nav;
use crate::token::decode_payload;

/// Sidebar entries on the admin dashboard.
const ADMIN_SECTIONS: [&str; 3] = ["Dashboard", "Users", "Products"];

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/admin.html")]
pub struct AdminTemplate {
    pub nav: Nav,
    pub welcome_name: String,
    pub email: String,
    pub sections: &'static [&'static str],
}

/// Client dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/client.html")]
pub struct ClientTemplate {
    pub nav: Nav,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    /// Token expiry, when the token carries one.
    pub session_expires: Option<String>,
}

/// Display the admin dashboard.
pub async fn admin(session: Session, admin: RequireAdmin) -> impl IntoResponse {
    let identity = admin.identity();
    let welcome_name = identity
        .first_name
        .clone()
        .or_else(|| Some(identity.email.clone()).filter(|e| !e.is_empty()))
        .unwrap_or_else(|| "Administrator".to_string());

    AdminTemplate {
        nav: Nav::load(&session, Some(identity)).await,
        welcome_name,
        email: identity.email.clone(),
        sections: &ADMIN_SECTIONS,
    }
}

/// Display the client dashboard.
pub async fn client(session: Session, client: RequireClient) -> impl IntoResponse {
    let identity = client.identity();
    let session_expires = decode_payload(identity.token())
        .ok()
        .and_then(|payload| payload.expires_at())
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string());

    ClientTemplate {
        nav: Nav::load(&session, Some(identity)).await,
        email: identity.email.clone(),
        full_name: identity.full_name(),
        role: identity
            .role
            .map_or_else(|| "Unknown".to_string(), |r| r.to_string()),
        session_expires,
    }
}
