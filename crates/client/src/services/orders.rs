//! Order desk.
//!
//! Reads orders and requests status transitions on behalf of the current
//! identity. Every request is checked against the authorization gate before
//! it reaches the order authority; the authority's answer is then checked
//! against what was asked for.

use thiserror::Error;
use tracing::instrument;

use bistro_core::{IllegalTransition, Order, OrderStatus};

use crate::authority::{AuthorityError, OrderAuthority};
use crate::models::Credential;
use crate::services::gate::{self, Action, DenyReason};

/// Errors from order reads and transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The lifecycle does not allow this status change.
    #[error("cannot move an order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// The current role may not do this.
    #[error("not allowed for this account")]
    Unauthorized,

    /// The order belongs to another customer.
    #[error("this order belongs to another customer")]
    NotOwner,

    /// Nobody is logged in.
    #[error("log in to see orders")]
    AuthenticationRequired,

    /// The order authority could not be reached.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The order authority refused the request or answered unexpectedly.
    #[error("server rejected request: {0}")]
    ServerRejected(String),
}

impl From<DenyReason> for OrderError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::AuthenticationRequired => Self::AuthenticationRequired,
            DenyReason::Unauthorized => Self::Unauthorized,
            DenyReason::NotOwner => Self::NotOwner,
            DenyReason::IllegalTransition(IllegalTransition { from, to }) => {
                Self::IllegalTransition { from, to }
            }
        }
    }
}

impl From<AuthorityError> for OrderError {
    fn from(err: AuthorityError) -> Self {
        match err {
            AuthorityError::Unauthenticated => Self::AuthenticationRequired,
            AuthorityError::Unavailable(msg) => Self::NetworkUnavailable(msg),
            AuthorityError::Rejected { status, message } => {
                Self::ServerRejected(format!("{status}: {message}"))
            }
        }
    }
}

/// Role-gated access to the order authority.
#[derive(Debug)]
pub struct OrderDesk<O> {
    authority: O,
}

impl<O: OrderAuthority> OrderDesk<O> {
    #[must_use]
    pub const fn new(authority: O) -> Self {
        Self { authority }
    }

    /// The order authority this desk talks to.
    pub const fn authority(&self) -> &O {
        &self.authority
    }

    /// Orders visible to the logged-in identity.
    ///
    /// Customers only ever receive their own orders, even if the authority
    /// returns more.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationRequired` when anonymous, or the mapped
    /// authority error.
    #[instrument(skip_all, fields(user_id = ?credential.map(|c| c.identity.id)))]
    pub async fn fetch_orders(&self, credential: Option<&Credential>) -> Result<Vec<Order>, OrderError> {
        let credential = credential
            .filter(|c| !c.identity.acts_as_guest())
            .ok_or(OrderError::AuthenticationRequired)?;
        let viewer = &credential.identity;

        let mut orders = self.authority.fetch_orders(&credential.token, viewer).await?;

        if !gate::authorize(Some(viewer), &Action::ViewAllOrders).is_allowed() {
            let fetched = orders.len();
            orders.retain(|order| order.is_owned_by(viewer.id));
            if orders.len() != fetched {
                tracing::warn!(
                    dropped = fetched - orders.len(),
                    "Order authority returned orders of other customers, dropping them"
                );
            }
        }

        tracing::debug!(count = orders.len(), "Fetched orders");
        Ok(orders)
    }

    /// Move `order` to `to`.
    ///
    /// The gate is consulted first; nothing is sent if it denies.
    ///
    /// # Errors
    ///
    /// Returns the gate's denial, the mapped authority error, or
    /// `ServerRejected` if the authority answers with a different status.
    #[instrument(skip_all, fields(order_id = %order.id, from = %order.status, to = %to))]
    pub async fn transition(
        &self,
        credential: Option<&Credential>,
        order: &Order,
        to: OrderStatus,
    ) -> Result<Order, OrderError> {
        let identity = credential.map(|c| &c.identity);
        gate::authorize(identity, &Action::TransitionOrder { order, to }).into_result()?;
        let credential = credential.ok_or(OrderError::Unauthorized)?;

        let updated = self.authority.transition(&credential.token, order.id, to).await?;
        if updated.id != order.id || updated.status != to {
            tracing::warn!(
                returned_id = %updated.id,
                returned_status = %updated.status,
                "Order authority answered with an unexpected order state"
            );
            return Err(OrderError::ServerRejected(format!(
                "requested {to}, order is {}",
                updated.status
            )));
        }

        tracing::info!("Order transitioned");
        Ok(updated)
    }

    /// Cancel `order`.
    ///
    /// # Errors
    ///
    /// Same as [`transition`](Self::transition).
    pub async fn cancel(&self, credential: Option<&Credential>, order: &Order) -> Result<Order, OrderError> {
        self.transition(credential, order, OrderStatus::Cancelled).await
    }
}

/// Fraction of the happy path `order` has covered; `None` if cancelled.
#[must_use]
pub fn progress(order: &Order) -> Option<f64> {
    order.status.progress()
}
