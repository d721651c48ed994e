//! Mock REST backend.
//!
//! Speaks the same JSON as the real backend for the endpoints the client
//! uses, mounted under `/api/`. Runs on an ephemeral port for the lifetime
//! of the test's runtime.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{OriginalUri, Path, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use url::Url;

use bistro_core::{Email, Identity, Order, OrderStatus, Role, UserId};

#[derive(Debug, Default)]
struct BackendState {
    users: Vec<(Identity, String)>,
    tokens: HashMap<String, UserId>,
    orders: BTreeMap<i64, Order>,
    requests: Vec<String>,
    login_delay: Option<Duration>,
    garble_logins: bool,
}

impl BackendState {
    fn issue(&mut self, identity: &Identity) -> String {
        let token = format!("srv-{}-{}", identity.id, self.tokens.len() + 1);
        self.tokens.insert(token.clone(), identity.id);
        token
    }

    fn bearer(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let id = self.tokens.get(token)?;
        self.users
            .iter()
            .find(|(identity, _)| identity.id == *id)
            .map(|(identity, _)| identity.clone())
    }
}

/// In-process stand-in for the Bistro REST backend.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<BackendState>>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account.
    #[must_use]
    pub fn with_user(self, identity: Identity, password: &str) -> Self {
        self.lock().users.push((identity, password.to_owned()));
        self
    }

    /// Seed orders.
    #[must_use]
    pub fn with_orders(self, orders: impl IntoIterator<Item = Order>) -> Self {
        self.lock()
            .orders
            .extend(orders.into_iter().map(|o| (o.id.as_i64(), o)));
        self
    }

    /// Delay every login answer.
    pub fn delay_logins(&self, delay: Duration) {
        self.lock().login_delay = Some(delay);
    }

    /// Answer logins with a body that is not JSON.
    pub fn garble_logins(&self, garble: bool) {
        self.lock().garble_logins = garble;
    }

    /// Invalidate every issued token.
    pub fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// Requests received so far, as `METHOD path?query`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    /// Current copy of an order.
    #[must_use]
    pub fn order(&self, id: i64) -> Option<Order> {
        self.lock().orders.get(&id).cloned()
    }

    /// Serve on `127.0.0.1` and return the API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn spawn(self) -> std::io::Result<Url> {
        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/me", get(me))
            .route("/orders", get(list_orders))
            .route("/orders/{id}/status", patch(update_status))
            .with_state(self);
        let app = Router::new().nest("/api", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Url::parse(&format!("http://{addr}/api/"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, method: &str, uri: &Uri) {
        let target = uri.path_and_query().map_or_else(|| uri.path().to_string(), ToString::to_string);
        self.lock().requests.push(format!("{method} {target}"));
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn login(
    State(backend): State<MockBackend>,
    OriginalUri(uri): OriginalUri,
    Json(body): Json<Value>,
) -> Response {
    backend.record("POST", &uri);
    let (delay, garble) = {
        let state = backend.lock();
        (state.login_delay, state.garble_logins)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if garble {
        return (StatusCode::OK, "<html>maintenance</html>").into_response();
    }

    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let mut state = backend.lock();
    let found = state
        .users
        .iter()
        .find(|(identity, pw)| identity.email.as_str() == email && pw == password)
        .map(|(identity, _)| identity.clone());
    match found {
        Some(identity) => {
            let token = state.issue(&identity);
            Json(json!({ "token": token, "user": identity })).into_response()
        }
        None => error(StatusCode::UNAUTHORIZED, "invalid credentials"),
    }
}

async fn register(
    State(backend): State<MockBackend>,
    OriginalUri(uri): OriginalUri,
    Json(body): Json<Value>,
) -> Response {
    backend.record("POST", &uri);
    let Ok(email) = Email::parse(body["email"].as_str().unwrap_or_default()) else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "invalid email");
    };
    let requested: Role = serde_json::from_value(body["role"].clone()).unwrap_or(Role::Customer);
    let password = body["password"].as_str().unwrap_or_default().to_owned();

    let mut state = backend.lock();
    if state.users.iter().any(|(identity, _)| identity.email == email) {
        return error(StatusCode::CONFLICT, "email already registered");
    }

    let next_id = i64::try_from(state.users.len()).unwrap_or(0) + 100;
    let identity = Identity {
        id: UserId::new(next_id),
        display_name: body["name"].as_str().unwrap_or_default().to_owned(),
        email,
        role: if requested.is_staff() { Role::Customer } else { requested },
        is_active: true,
    };
    state.users.push((identity.clone(), password));
    let token = state.issue(&identity);
    (
        StatusCode::CREATED,
        Json(json!({ "token": token, "user": identity })),
    )
        .into_response()
}

async fn me(
    State(backend): State<MockBackend>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    backend.record("GET", &uri);
    match backend.lock().bearer(&headers) {
        Some(identity) => Json(identity).into_response(),
        None => error(StatusCode::UNAUTHORIZED, "invalid token"),
    }
}

async fn list_orders(
    State(backend): State<MockBackend>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    backend.record("GET", &uri);
    let state = backend.lock();
    let Some(viewer) = state.bearer(&headers) else {
        return error(StatusCode::UNAUTHORIZED, "invalid token");
    };

    let customer = uri
        .query()
        .and_then(|q| q.strip_prefix("customerId="))
        .and_then(|id| id.parse::<i64>().ok());
    if customer.is_none() && !viewer.role.is_staff() {
        return error(StatusCode::FORBIDDEN, "staff only");
    }

    let orders: Vec<&Order> = state
        .orders
        .values()
        .filter(|order| customer.is_none_or(|id| order.customer_id.as_i64() == id))
        .collect();
    Json(orders).into_response()
}

async fn update_status(
    State(backend): State<MockBackend>,
    Path(id): Path<i64>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    backend.record("PATCH", &uri);
    let mut state = backend.lock();
    if state.bearer(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "invalid token");
    }
    let Ok(to) = serde_json::from_value::<OrderStatus>(body["status"].clone()) else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "invalid status");
    };
    let Some(order) = state.orders.get_mut(&id) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "order not found" }))).into_response();
    };
    if let Err(illegal) = order.status.validate_transition(to) {
        return error(StatusCode::CONFLICT, &illegal.to_string());
    }

    order.status = to;
    Json(order.clone()).into_response()
}
