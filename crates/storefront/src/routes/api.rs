//! JSON endpoints.

use axum::Json;
use serde::Serialize;

use crate::middleware::RequireAuthenticated;
use crate::token::role_of;

/// Response body for `GET /api/me`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Role decoded from the token on this request.
    pub role: Option<String>,
}

/// Who the session is signed in as. `401` when anonymous.
pub async fn me(RequireAuthenticated(identity): RequireAuthenticated) -> Json<MeResponse> {
    Json(MeResponse {
        role: role_of(identity.token()).map(|r| r.to_string()),
        email: identity.email,
        first_name: identity.first_name,
        last_name: identity.last_name,
    })
}
