//! Contracts for the backend collaborators.
//!
//! The state engine never speaks HTTP itself. It calls an
//! [`IdentityAuthority`] to log in, register and resolve stored tokens, and
//! an [`OrderAuthority`] to read and transition orders. [`crate::api`]
//! implements both against the REST backend; the `test-util` feature adds
//! in-memory versions.

use std::future::Future;

use secrecy::SecretString;
use thiserror::Error;

use bistro_core::{BearerToken, Email, Identity, Order, OrderId, OrderStatus, Role};

/// Failure reported by a backend collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    /// The credentials or token were not accepted.
    #[error("credentials rejected")]
    Unauthenticated,

    /// The backend could not be reached, or timed out.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered, but refused or garbled the request.
    #[error("backend rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status, or 0 when the body could not be decoded.
        status: u16,
        /// Backend message.
        message: String,
    },
}

/// Successful login or registration.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub token: BearerToken,
    pub identity: Identity,
}

/// Registration form.
///
/// `role` is what the user asked for; the authority decides what they get.
#[derive(Debug)]
pub struct NewAccount<'a> {
    pub display_name: String,
    pub email: Email,
    pub secret: &'a SecretString,
    pub role: Role,
}

/// Issues and verifies bearer tokens.
pub trait IdentityAuthority: Send + Sync {
    /// Exchange email and password for a token.
    fn login(
        &self,
        email: &Email,
        secret: &SecretString,
    ) -> impl Future<Output = Result<AuthGrant, AuthorityError>> + Send;

    /// Create an account and log it in.
    fn register(
        &self,
        account: &NewAccount<'_>,
    ) -> impl Future<Output = Result<AuthGrant, AuthorityError>> + Send;

    /// Resolve a stored token to the live identity it belongs to.
    fn resolve(
        &self,
        token: &BearerToken,
    ) -> impl Future<Output = Result<Identity, AuthorityError>> + Send;
}

/// Backend of record for orders.
///
/// Requests arrive pre-validated by [`crate::services::orders::OrderDesk`],
/// but the backend must enforce the same rules itself.
pub trait OrderAuthority: Send + Sync {
    /// Orders visible to `viewer`: their own for customers, all for staff.
    fn fetch_orders(
        &self,
        token: &BearerToken,
        viewer: &Identity,
    ) -> impl Future<Output = Result<Vec<Order>, AuthorityError>> + Send;

    /// Move an order to `status`, returning the updated order.
    fn transition(
        &self,
        token: &BearerToken,
        order_id: OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<Order, AuthorityError>> + Send;
}
