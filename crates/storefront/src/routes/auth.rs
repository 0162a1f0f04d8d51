//! Authentication route handlers.
//!
//! Login and registration validate locally, make exactly one backend call,
//! and on success store the identity in the session and send the browser to
//! the dashboard for its role.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiError, AuthData};
use crate::error::{AppError, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::forms::{FieldErrors, LoginForm, RegisterForm};
use crate::middleware::OptionalIdentity;
use crate::models::Identity;
use crate::routes::nav::Nav;
use crate::session::SessionStore;
use crate::state::AppState;
use crate::token::decode_payload;

/// Where registration without an immediate sign-in lands.
pub const REGISTERED_REDIRECT: &str = "/auth/login?registered=1";

const INVALID_TOKEN_MESSAGE: &str = "The server returned a session we could not read. Please try again.";
const LOGIN_FALLBACK_MESSAGE: &str = "Invalid email or password.";
const REGISTER_FALLBACK_MESSAGE: &str = "We could not create your account.";

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Set after a registration that did not sign the user in.
    pub registered: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub email: String,
    pub errors: FieldErrors,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub form: RegisterForm,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl RegisterTemplate {
    fn new(nav: Nav, form: &RegisterForm) -> Self {
        // Never echo passwords back into the page
        let form = RegisterForm {
            password: String::new(),
            confirm_password: String::new(),
            ..form.clone()
        };
        Self {
            nav,
            form,
            errors: FieldErrors::default(),
            error: None,
        }
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    session: Session,
    OptionalIdentity(identity): OptionalIdentity,
    Query(query): Query<LoginQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        nav: Nav::load(&session, identity.as_ref()).await,
        email: String::new(),
        errors: FieldErrors::default(),
        error: None,
        notice: query
            .registered
            .map(|_| "Your account was created. Please sign in.".to_string()),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, identity, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    OptionalIdentity(identity): OptionalIdentity,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let mut page = LoginTemplate {
        nav: Nav::load(&session, identity.as_ref()).await,
        email: form.email.trim().to_string(),
        errors: FieldErrors::default(),
        error: None,
        notice: None,
    };

    let credentials = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => {
            page.errors = errors;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    add_breadcrumb("auth", "Login submitted", None);
    match state.api().login(&credentials).await {
        Ok(auth) => match sign_in(&session, &auth).await? {
            Some(target) => Ok(Redirect::to(target).into_response()),
            None => {
                page.error = Some(INVALID_TOKEN_MESSAGE.to_string());
                Ok((StatusCode::BAD_GATEWAY, page).into_response())
            }
        },
        Err(err) => {
            tracing::info!(error = %err, "Login failed");
            let status = failure_status(&err);
            page.error = Some(failure_message(&err, LOGIN_FALLBACK_MESSAGE));
            Ok((status, page).into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    session: Session,
    OptionalIdentity(identity): OptionalIdentity,
) -> impl IntoResponse {
    RegisterTemplate::new(
        Nav::load(&session, identity.as_ref()).await,
        &RegisterForm::default(),
    )
}

/// Handle registration form submission.
#[instrument(skip(state, session, identity, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    OptionalIdentity(identity): OptionalIdentity,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let mut page = RegisterTemplate::new(Nav::load(&session, identity.as_ref()).await, &form);

    let registration = match form.validate() {
        Ok(registration) => registration,
        Err(errors) => {
            page.errors = errors;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    add_breadcrumb("auth", "Registration submitted", None);
    match state.api().register(&registration).await {
        Ok(Some(auth)) if auth.token.as_deref().is_some_and(|t| !t.is_empty()) => {
            match sign_in(&session, &auth).await? {
                Some(target) => Ok(Redirect::to(target).into_response()),
                None => {
                    page.error = Some(INVALID_TOKEN_MESSAGE.to_string());
                    Ok((StatusCode::BAD_GATEWAY, page).into_response())
                }
            }
        }
        Ok(_) => {
            tracing::info!("Registration accepted without sign-in");
            Ok(Redirect::to(REGISTERED_REDIRECT).into_response())
        }
        Err(err) => {
            tracing::info!(error = %err, "Registration failed");
            let status = failure_status(&err);
            page.error = Some(failure_message(&err, REGISTER_FALLBACK_MESSAGE));
            Ok((status, page).into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out and return to the catalog.
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    let mut store = SessionStore::open(session).await?;
    store.logout().await?;
    clear_sentry_user();
    add_breadcrumb("auth", "Logged out", None);
    Ok(Redirect::to("/"))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Store the identity from a successful auth reply.
///
/// Returns the path to navigate to, or `None` when the token cannot be
/// decoded, in which case the session is left untouched.
async fn sign_in(session: &Session, auth: &AuthData) -> Result<Option<&'static str>, AppError> {
    let token = auth.token.as_deref().unwrap_or_default();
    let payload = match decode_payload(token) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Backend returned an undecodable token");
            return Ok(None);
        }
    };

    let identity = Identity::from_auth(auth, token, &payload);
    let role = identity.role;

    session.cycle_id().await?;
    let mut store = SessionStore::open(session.clone()).await?;
    set_sentry_user(&identity.email, role.map(|r| r.as_str()));
    store.login(identity).await?;

    let target = role.map_or("/", |r| r.home_path());
    tracing::info!(role = ?role, target, "Signed in");
    Ok(Some(target))
}

fn failure_message(err: &ApiError, fallback: &str) -> String {
    match err {
        ApiError::Rejected { message: Some(m) } if !m.trim().is_empty() => m.clone(),
        ApiError::Rejected { .. } | ApiError::Status(400..=499) => fallback.to_string(),
        _ => err.user_message(),
    }
}

const fn failure_status(err: &ApiError) -> StatusCode {
    if err.is_rejection() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::BAD_GATEWAY
    }
}
