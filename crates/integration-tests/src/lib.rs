//! End-to-end harness for the IDWM storefront.
//!
//! [`FakeBackend`] answers the three shop endpoints the storefront calls
//! (`Auth/login`, `Auth/register`, `Product`) with canned envelopes and counts
//! every call. [`TestContext`] boots the storefront against it on an
//! ephemeral port and drives it with a cookie-keeping client that does not
//! follow redirects, so tests can assert on `Location` headers.
//!
//! ```rust,ignore
//! let ctx = TestContext::new().await;
//! ctx.backend.set_login(Reply::ok(auth_data("ana@example.com", "User")));
//! let resp = ctx.login("ana@example.com", "secret1").await;
//! assert_eq!(resp.headers()["location"], "/client");
//! ```

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::{Client, Response, redirect::Policy};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use idwm_storefront::config::{BackendConfig, SentryConfig, StorefrontConfig};
use idwm_storefront::state::AppState;

/// Expiry far enough out that test tokens never lapse (2100-01-01).
const FAR_FUTURE_EXP: i64 = 4_102_444_800;

// =============================================================================
// Canned Replies
// =============================================================================

/// A status code and JSON body the fake backend answers with.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    /// `200` with a successful envelope around `data`.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({ "success": true, "message": null, "data": data, "errors": null }),
        }
    }

    /// `200` with `success: false` and the given message.
    #[must_use]
    pub fn rejected(message: &str) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({ "success": false, "message": message, "data": null, "errors": null }),
        }
    }

    /// A bare status with no envelope.
    #[must_use]
    pub const fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: Value::Null,
        }
    }
}

// =============================================================================
// Fake Backend
// =============================================================================

#[derive(Default)]
struct Calls {
    login: AtomicUsize,
    register: AtomicUsize,
    products: AtomicUsize,
}

struct Replies {
    login: Reply,
    register: Reply,
    products: Reply,
    pages: HashMap<u32, Reply>,
    delays: HashMap<u32, Duration>,
}

impl Default for Replies {
    fn default() -> Self {
        Self {
            login: Reply::rejected("Invalid credentials"),
            register: Reply::ok(Value::Null),
            products: Reply::ok(json!([])),
            pages: HashMap::new(),
            delays: HashMap::new(),
        }
    }
}

#[derive(Clone, Default)]
struct BackendState {
    calls: Arc<Calls>,
    replies: Arc<Mutex<Replies>>,
    requested_pages: Arc<Mutex<Vec<u32>>>,
    last_login: Arc<Mutex<Option<Value>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the shop backend.
#[derive(Clone)]
pub struct FakeBackend {
    addr: SocketAddr,
    state: BackendState,
}

impl FakeBackend {
    /// Bind on an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = BackendState::default();
        let app = Router::new()
            .route("/api/Auth/login", post(login))
            .route("/api/Auth/register", post(register))
            .route("/api/Product", get(products))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Base URL the storefront should be pointed at.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    pub fn set_login(&self, reply: Reply) {
        lock(&self.state.replies).login = reply;
    }

    pub fn set_register(&self, reply: Reply) {
        lock(&self.state.replies).register = reply;
    }

    /// Reply for every catalog page without its own override.
    pub fn set_products(&self, reply: Reply) {
        lock(&self.state.replies).products = reply;
    }

    /// Reply for one catalog page.
    pub fn set_page(&self, page: u32, reply: Reply) {
        lock(&self.state.replies).pages.insert(page, reply);
    }

    /// Hold the reply for `page` back by `delay`.
    pub fn delay_page(&self, page: u32, delay: Duration) {
        lock(&self.state.replies).delays.insert(page, delay);
    }

    #[must_use]
    pub fn login_calls(&self) -> usize {
        self.state.calls.login.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn register_calls(&self) -> usize {
        self.state.calls.register.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn product_calls(&self) -> usize {
        self.state.calls.products.load(Ordering::SeqCst)
    }

    /// `PageNumber` of every catalog request, in arrival order.
    #[must_use]
    pub fn requested_pages(&self) -> Vec<u32> {
        lock(&self.state.requested_pages).clone()
    }

    /// Body of the most recent login request.
    #[must_use]
    pub fn last_login(&self) -> Option<Value> {
        lock(&self.state.last_login).clone()
    }
}

async fn login(State(state): State<BackendState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.calls.login.fetch_add(1, Ordering::SeqCst);
    *lock(&state.last_login) = Some(body);
    let reply = lock(&state.replies).login.clone();
    (reply.status, Json(reply.body))
}

async fn register(State(state): State<BackendState>) -> (StatusCode, Json<Value>) {
    state.calls.register.fetch_add(1, Ordering::SeqCst);
    let reply = lock(&state.replies).register.clone();
    (reply.status, Json(reply.body))
}

async fn products(
    State(state): State<BackendState>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.calls.products.fetch_add(1, Ordering::SeqCst);
    let page = query
        .get("PageNumber")
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(1);
    lock(&state.requested_pages).push(page);

    let (reply, delay) = {
        let replies = lock(&state.replies);
        let reply = replies
            .pages
            .get(&page)
            .unwrap_or(&replies.products)
            .clone();
        (reply, replies.delays.get(&page).copied())
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    (reply.status, Json(reply.body))
}

// =============================================================================
// Tokens and Payloads
// =============================================================================

/// An unsigned JWT carrying `claims`. The storefront never checks signatures.
#[must_use]
pub fn token_for(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// A token for `email` with the given role claim.
#[must_use]
pub fn token_with_role(email: &str, role: &str) -> String {
    token_for(&json!({ "email": email, "role": role, "exp": FAR_FUTURE_EXP }))
}

/// Auth reply data as `Auth/login` returns it.
#[must_use]
pub fn auth_data(email: &str, role: &str) -> Value {
    json!({
        "email": email,
        "firstName": "Ana",
        "lastName": "Rojas",
        "token": token_with_role(email, role),
    })
}

/// A product as `GET Product` returns it.
#[must_use]
pub fn product(id: i64, name: &str, price: f64) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "description": format!("{name} description"),
        "urls": [format!("https://img.example/{id}.png")],
    })
}

// =============================================================================
// Test Context
// =============================================================================

/// A running storefront wired to a fresh [`FakeBackend`].
pub struct TestContext {
    pub backend: FakeBackend,
    pub client: Client,
    base_url: String,
}

impl TestContext {
    /// Start a backend and a storefront with a fresh cookie jar.
    pub async fn new() -> Self {
        let backend = FakeBackend::start().await;
        let config = StorefrontConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            backend: BackendConfig::new(&backend.api_url(), Duration::from_secs(5))
                .expect("Invalid fake backend URL"),
            page_size: 10,
            rate_limit_auth: false,
            sentry: SentryConfig::default(),
        };
        let state = AppState::new(config).expect("Failed to build storefront state");
        let app = idwm_storefront::app(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront");
        let addr = listener.local_addr().expect("Storefront has no address");
        tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        Self {
            backend,
            client: Self::browser(),
            base_url: format!("http://{addr}"),
        }
    }

    /// A client with its own cookie jar, as a second browser would have.
    #[must_use]
    pub fn browser() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Submit the login form.
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.post_form("/auth/login", &[("email", email), ("password", password)])
            .await
    }

    /// Sign in with a backend reply carrying `role`.
    pub async fn sign_in_as(&self, email: &str, role: &str) -> Response {
        self.backend.set_login(Reply::ok(auth_data(email, role)));
        self.login(email, "secret1").await
    }
}

/// The `Location` header of a redirect, or an empty string.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
