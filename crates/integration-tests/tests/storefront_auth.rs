//! End-to-end tests for sign-in, registration and sign-out.
//!
//! Each test boots its own storefront against a fake shop backend; no
//! external services are needed.

use idwm_integration_tests::{Reply, TestContext, auth_data, location, token_with_role};
use reqwest::StatusCode;
use serde_json::{Value, json};

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_as_admin_lands_on_admin_dashboard() {
    let ctx = TestContext::new().await;

    let resp = ctx.sign_in_as("boss@example.com", "Admin").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin");
    assert_eq!(ctx.backend.login_calls(), 1);

    let resp = ctx.get("/admin").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Welcome, Ana"));
}

#[tokio::test]
async fn test_login_as_user_lands_on_client_dashboard() {
    let ctx = TestContext::new().await;

    let resp = ctx.sign_in_as("ana@example.com", "User").await;
    assert_eq!(location(&resp), "/client");

    let body = ctx.get("/client").await.text().await.expect("Failed to read response");
    assert!(body.contains("ana@example.com"));
    assert!(body.contains("Ana Rojas"));
    assert!(body.contains("Session expires"));
}

#[tokio::test]
async fn test_login_sends_trimmed_credentials_once() {
    let ctx = TestContext::new().await;
    ctx.backend
        .set_login(Reply::ok(auth_data("ana@example.com", "User")));

    ctx.login("  ana@example.com ", "secret1").await;

    assert_eq!(ctx.backend.login_calls(), 1);
    let sent = ctx.backend.last_login().expect("Login body not recorded");
    assert_eq!(sent["email"], "ana@example.com");
    assert_eq!(sent["password"], "secret1");
}

#[tokio::test]
async fn test_login_with_unknown_role_goes_home() {
    let ctx = TestContext::new().await;

    let resp = ctx.sign_in_as("guest@example.com", "Auditor").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    // Signed in, but neither dashboard opens
    assert_eq!(ctx.get("/api/me").await.status(), StatusCode::OK);
    assert_eq!(location(&ctx.get("/admin").await), "/");
}

#[tokio::test]
async fn test_backend_rejection_shows_message_and_keeps_session() {
    let ctx = TestContext::new().await;
    ctx.backend.set_login(Reply::rejected("Usuario no encontrado"));

    let resp = ctx.login("ana@example.com", "wrong-password").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Usuario no encontrado"));
    assert!(body.contains("value=\"ana@example.com\""));

    assert_eq!(ctx.get("/api/me").await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_failed_login_does_not_sign_out_existing_session() {
    let ctx = TestContext::new().await;
    ctx.sign_in_as("ana@example.com", "User").await;

    ctx.backend.set_login(Reply::rejected("Invalid credentials"));
    let resp = ctx.login("ana@example.com", "wrong-password").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    // The re-rendered form still shows who is signed in
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Log out"));
    assert!(body.contains("href=\"/client\""));

    let me: Value = ctx
        .get("/api/me")
        .await
        .json()
        .await
        .expect("Failed to parse identity");
    assert_eq!(me["email"], "ana@example.com");
}

#[tokio::test]
async fn test_backend_error_status_is_reported() {
    let ctx = TestContext::new().await;
    ctx.backend
        .set_login(Reply::status(StatusCode::INTERNAL_SERVER_ERROR));

    let resp = ctx.login("ana@example.com", "secret1").await;
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("HTTP 500"));
    assert_eq!(ctx.get("/api/me").await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_form_never_reaches_backend() {
    let ctx = TestContext::new().await;

    let resp = ctx.login("", "").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Email is required."));
    assert!(body.contains("Password is required."));

    let resp = ctx.login("not-an-email", "secret1").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Enter a valid email address."));

    assert_eq!(ctx.backend.login_calls(), 0);
}

#[tokio::test]
async fn test_undecodable_token_is_refused() {
    let ctx = TestContext::new().await;
    ctx.backend.set_login(Reply::ok(json!({
        "email": "ana@example.com",
        "token": "not-a-jwt",
    })));

    let resp = ctx.login("ana@example.com", "secret1").await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("could not read"));

    assert_eq!(ctx.get("/api/me").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(location(&ctx.get("/client").await), "/auth/login");
}

#[tokio::test]
async fn test_login_without_token_is_an_error() {
    let ctx = TestContext::new().await;
    ctx.backend
        .set_login(Reply::ok(json!({ "email": "ana@example.com" })));

    let resp = ctx.login("ana@example.com", "secret1").await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(ctx.get("/api/me").await.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Registration
// ============================================================================

fn registration<'a>(email: &'a str, password: &'a str, confirm: &'a str) -> [(&'a str, &'a str); 6] {
    [
        ("first_name", "Ana"),
        ("last_name", "Rojas"),
        ("email", email),
        ("phone", "+56912345678"),
        ("password", password),
        ("confirm_password", confirm),
    ]
}

#[tokio::test]
async fn test_register_without_token_sends_to_login() {
    let ctx = TestContext::new().await;
    ctx.backend.set_register(Reply::ok(Value::Null));

    let resp = ctx
        .post_form(
            "/auth/register",
            &registration("ana@example.com", "secret1", "secret1"),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login?registered=1");
    assert_eq!(ctx.backend.register_calls(), 1);

    let body = ctx
        .get("/auth/login?registered=1")
        .await
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains("Your account was created"));
    assert_eq!(ctx.get("/api/me").await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_with_token_signs_in() {
    let ctx = TestContext::new().await;
    ctx.backend.set_register(Reply::ok(json!({
        "email": "ana@example.com",
        "firstName": "Ana",
        "lastName": "Rojas",
        "token": token_with_role("ana@example.com", "User"),
    })));

    let resp = ctx
        .post_form(
            "/auth/register",
            &registration("ana@example.com", "secret1", "secret1"),
        )
        .await;
    assert_eq!(location(&resp), "/client");
    assert_eq!(ctx.get("/client").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_mismatched_passwords() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post_form(
            "/auth/register",
            &registration("ana@example.com", "secret1", "secret2"),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Passwords do not match."));
    // Passwords are never echoed back
    assert!(!body.contains("secret1"));
    assert_eq!(ctx.backend.register_calls(), 0);
}

#[tokio::test]
async fn test_register_rejection_shows_backend_message() {
    let ctx = TestContext::new().await;
    ctx.backend
        .set_register(Reply::rejected("El correo ya está registrado"));

    let resp = ctx
        .post_form(
            "/auth/register",
            &registration("ana@example.com", "secret1", "secret1"),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("El correo ya está registrado"));
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_clears_session() {
    let ctx = TestContext::new().await;
    ctx.sign_in_as("ana@example.com", "User").await;
    assert_eq!(ctx.get("/api/me").await.status(), StatusCode::OK);

    let resp = ctx.post_form("/auth/logout", &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    assert_eq!(ctx.get("/api/me").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(location(&ctx.get("/client").await), "/auth/login");
}

#[tokio::test]
async fn test_me_reports_identity() {
    let ctx = TestContext::new().await;
    ctx.sign_in_as("boss@example.com", "Admin").await;

    let me: Value = ctx
        .get("/api/me")
        .await
        .json()
        .await
        .expect("Failed to parse identity");
    assert_eq!(me["email"], "boss@example.com");
    assert_eq!(me["firstName"], "Ana");
    assert_eq!(me["role"], "Admin");
}
