//! REST backend client.
//!
//! Implements [`IdentityAuthority`] and [`OrderAuthority`] over JSON/HTTP.
//!
//! # Endpoints
//!
//! All paths are relative to the configured base URL.
//!
//! | Call       | Request                                           | Success          |
//! |------------|---------------------------------------------------|------------------|
//! | login      | `POST auth/login` `{email, password}`             | `{token, user}`  |
//! | register   | `POST auth/register` `{name, email, password, role}` | `{token, user}` |
//! | resolve    | `GET auth/me` (bearer)                            | `user`           |
//! | orders     | `GET orders[?customerId=]` (bearer)               | `[order]`        |
//! | transition | `PATCH orders/{id}/status` `{status}` (bearer)    | `order`          |
//!
//! # Errors
//!
//! 401 (and 403 on identity calls) maps to `Unauthenticated`, other non-2xx
//! statuses to `Rejected`, transport failures and timeouts to `Unavailable`,
//! and a body that does not decode to `Rejected` with status 0.

mod types;

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use bistro_core::{BearerToken, Email, Identity, Order, OrderId, OrderStatus};

use crate::authority::{AuthGrant, AuthorityError, IdentityAuthority, NewAccount, OrderAuthority};
use crate::config::ClientConfig;
use types::{AuthResponse, ErrorBody, LoginRequest, RegisterRequest, StatusRequest};

/// Which kind of endpoint answered; decides how 403 is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Identity,
    Orders,
}

/// HTTP client for the Bistro backend.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend
    /// initialisation).
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("bistro-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
            }),
        })
    }

    /// Backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthorityError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| AuthorityError::Rejected {
                status: 0,
                message: format!("invalid endpoint {path}: {e}"),
            })
    }

    async fn grant(&self, request: reqwest::RequestBuilder) -> Result<AuthGrant, AuthorityError> {
        let response = request.send().await.map_err(transport_error)?;
        let body: AuthResponse = decode(response, Surface::Identity).await?;
        Ok(AuthGrant {
            token: BearerToken::new(body.token),
            identity: body.user,
        })
    }
}

impl IdentityAuthority for ApiClient {
    #[instrument(skip(self, secret), fields(email = %email))]
    async fn login(&self, email: &Email, secret: &SecretString) -> Result<AuthGrant, AuthorityError> {
        let request = self.inner.client.post(self.endpoint("auth/login")?).json(&LoginRequest {
            email: email.as_str(),
            password: secret.expose_secret(),
        });
        self.grant(request).await
    }

    #[instrument(skip(self, account), fields(email = %account.email, role = %account.role))]
    async fn register(&self, account: &NewAccount<'_>) -> Result<AuthGrant, AuthorityError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("auth/register")?)
            .json(&RegisterRequest {
                name: &account.display_name,
                email: account.email.as_str(),
                password: account.secret.expose_secret(),
                role: account.role,
            });
        self.grant(request).await
    }

    #[instrument(skip_all)]
    async fn resolve(&self, token: &BearerToken) -> Result<Identity, AuthorityError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("auth/me")?)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(transport_error)?;
        decode(response, Surface::Identity).await
    }
}

impl OrderAuthority for ApiClient {
    #[instrument(skip(self, token, viewer), fields(user_id = %viewer.id, role = %viewer.role))]
    async fn fetch_orders(
        &self,
        token: &BearerToken,
        viewer: &Identity,
    ) -> Result<Vec<Order>, AuthorityError> {
        let mut url = self.endpoint("orders")?;
        if !viewer.role.is_staff() {
            url.query_pairs_mut()
                .append_pair("customerId", &viewer.id.to_string());
        }

        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(transport_error)?;
        decode(response, Surface::Orders).await
    }

    #[instrument(skip(self, token))]
    async fn transition(
        &self,
        token: &BearerToken,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, AuthorityError> {
        let response = self
            .inner
            .client
            .patch(self.endpoint(&format!("orders/{order_id}/status"))?)
            .bearer_auth(token.expose())
            .json(&StatusRequest { status })
            .send()
            .await
            .map_err(transport_error)?;
        decode(response, Surface::Orders).await
    }
}

// =============================================================================
// Response handling
// =============================================================================

fn transport_error(err: reqwest::Error) -> AuthorityError {
    if err.is_timeout() {
        tracing::warn!(error = %err, "Backend request timed out");
    } else {
        tracing::warn!(error = %err, "Backend request failed");
    }
    AuthorityError::Unavailable(err.to_string())
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    surface: Surface,
) -> Result<T, AuthorityError> {
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;

    if let Some(err) = classify(status, surface, &body) {
        return Err(err);
    }

    serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(%status, error = %e, "Undecodable backend response");
        AuthorityError::Rejected {
            status: 0,
            message: format!("undecodable response: {e}"),
        }
    })
}

fn classify(status: StatusCode, surface: Surface, body: &[u8]) -> Option<AuthorityError> {
    if status.is_success() {
        return None;
    }
    if status == StatusCode::UNAUTHORIZED
        || (status == StatusCode::FORBIDDEN && surface == Surface::Identity)
    {
        return Some(AuthorityError::Unauthenticated);
    }

    let message = ErrorBody::message_from(&String::from_utf8_lossy(body));
    tracing::debug!(%status, reason = %message, "Backend rejected request");
    Some(AuthorityError::Rejected {
        status: status.as_u16(),
        message,
    })
}
