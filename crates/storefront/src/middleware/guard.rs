//! Route guards for the role-gated dashboards.
//!
//! Guards only decide what the browser is shown. The backend re-checks the
//! token on every call it serves, so nothing here is an authorization
//! boundary for data.
//!
//! The decision itself is the pure [`evaluate`]; the extractors wrap it with
//! session access and turn the outcome into a redirect (HTML) or a status
//! code (`/api/` paths).

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use idwm_core::Role;
use tower_sessions::Session;

use crate::error::clear_sentry_user;
use crate::models::Identity;
use crate::session::{SessionStatus, SessionStore};
use crate::token::decode_payload;

/// Login page path.
pub const LOGIN_PATH: &str = "/auth/login";

/// Public landing path.
pub const HOME_PATH: &str = "/";

// =============================================================================
// Evaluation
// =============================================================================

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// The session has not been read yet. Render nothing protected.
    Checking,
    /// No token: send the browser to the login page.
    Unauthenticated,
    /// A token that is unreadable or carries another role: send the browser
    /// home, never to login.
    WrongRole,
    Authorized,
}

/// Decide whether a holder of `token` may see an area requiring `required`.
#[must_use]
pub fn evaluate(required: Role, token: Option<&str>) -> GuardState {
    let Some(token) = token else {
        return GuardState::Unauthenticated;
    };

    match decode_payload(token).map(|payload| payload.role()) {
        Ok(Some(role)) if role == required => GuardState::Authorized,
        _ => GuardState::WrongRole,
    }
}

/// [`evaluate`] against a session store, honouring its lifecycle.
#[must_use]
pub fn evaluate_store<S>(required: Role, store: &SessionStore<S>) -> GuardState
where
    S: crate::session::TokenSlot,
{
    match store.status() {
        SessionStatus::Checking => GuardState::Checking,
        SessionStatus::Unauthenticated => GuardState::Unauthenticated,
        SessionStatus::Authenticated => evaluate(required, store.token()),
    }
}

// =============================================================================
// Rejections
// =============================================================================

/// Error returned when a guard refuses a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Redirect to the public landing page (for HTML requests).
    RedirectHome,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Forbidden response (for API requests).
    Forbidden,
    /// The session layer is missing or the session could not be read.
    SessionUnavailable,
}

impl GuardRejection {
    fn for_state(state: GuardState, parts: &Parts) -> Self {
        let is_api = parts.uri.path().starts_with("/api/");
        match (state, is_api) {
            (GuardState::WrongRole, false) => Self::RedirectHome,
            (GuardState::WrongRole, true) => Self::Forbidden,
            (_, false) => Self::RedirectToLogin,
            (_, true) => Self::Unauthorized,
        }
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::RedirectHome => Redirect::to(HOME_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
            Self::SessionUnavailable => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

async fn open_store(parts: &Parts) -> Result<SessionStore<Session>, GuardRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or(GuardRejection::SessionUnavailable)?;

    SessionStore::open(session).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read session");
        GuardRejection::SessionUnavailable
    })
}

/// Log out a session whose token cannot be decoded.
async fn drop_undecodable(store: &mut SessionStore<Session>) {
    let undecodable = store
        .token()
        .is_some_and(|token| decode_payload(token).is_err());
    if !undecodable {
        return;
    }

    tracing::warn!("Clearing session with undecodable token");
    if let Err(e) = store.logout().await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();
}

// =============================================================================
// Role Guards
// =============================================================================

/// A section of the site restricted to one role.
pub trait ProtectedArea: Send + Sync + 'static {
    /// Role a token must carry to enter.
    const ROLE: Role;
    /// Name used in logs.
    const NAME: &'static str;
}

/// The admin dashboard.
pub struct AdminArea;

impl ProtectedArea for AdminArea {
    const ROLE: Role = Role::Admin;
    const NAME: &'static str = "admin";
}

/// The client dashboard.
pub struct ClientArea;

impl ProtectedArea for ClientArea {
    const ROLE: Role = Role::User;
    const NAME: &'static str = "client";
}

/// Extractor that admits only sessions whose token carries `A::ROLE`.
///
/// Evaluated on every request, so a logout in another tab takes effect on
/// the next render.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(admin: RequireAdmin) -> impl IntoResponse {
///     format!("Welcome, {}", admin.identity().display_name())
/// }
/// ```
pub struct Guarded<A>(pub Identity, pub PhantomData<A>);

/// Admin-only extractor.
pub type RequireAdmin = Guarded<AdminArea>;

/// Client-only extractor.
pub type RequireClient = Guarded<ClientArea>;

impl<A> Guarded<A> {
    /// The admitted identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.0
    }
}

impl<S, A> FromRequestParts<S> for Guarded<A>
where
    S: Send + Sync,
    A: ProtectedArea,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut store = open_store(parts).await?;

        let state = evaluate_store(A::ROLE, &store);
        tracing::debug!(area = A::NAME, ?state, "Guard evaluated");

        if state == GuardState::Authorized
            && let Some(identity) = store.identity().cloned()
        {
            return Ok(Self(identity, PhantomData));
        }

        if state == GuardState::WrongRole {
            drop_undecodable(&mut store).await;
        }
        Err(GuardRejection::for_state(state, parts))
    }
}

// =============================================================================
// Authentication-only Guards
// =============================================================================

/// Extractor that admits any signed-in session, whatever its role.
pub struct RequireAuthenticated(pub Identity);

impl<S> FromRequestParts<S> for RequireAuthenticated
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut store = open_store(parts).await?;
        drop_undecodable(&mut store).await;

        store
            .identity()
            .cloned()
            .map(Self)
            .ok_or_else(|| GuardRejection::for_state(GuardState::Unauthenticated, parts))
    }
}

/// Extractor that optionally gets the current identity.
///
/// Unlike the guards, this never rejects. Used for the navigation bar.
pub struct OptionalIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = match open_store(parts).await {
            Ok(store) => store.identity().cloned(),
            Err(_) => None,
        };

        Ok(Self(identity))
    }
}
