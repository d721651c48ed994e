//! Authorization gate.
//!
//! One pure policy function decides whether the current identity may perform
//! an action. The collection stores, the order desk and any admin-only
//! command consult it instead of checking roles inline.
//!
//! # Order transitions
//!
//! Checked in this order:
//!
//! 1. anonymous, guest or deactivated identities: `Unauthorized`
//! 2. anything but a cancel, by a role other than staff/admin: `Unauthorized`
//! 3. a customer cancelling someone else's order: `NotOwner`
//! 4. a transition the lifecycle forbids: `IllegalTransition`
//! 5. a customer cancelling once the kitchen has started: `Unauthorized`
//!
//! Customers may cancel their own orders while `PENDING` or `CONFIRMED`.

use bistro_core::{IllegalTransition, Identity, Order, OrderStatus, Role};

/// Statuses from which a customer may still cancel their own order.
pub const CUSTOMER_CANCELLABLE: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Confirmed];

/// Something a UI surface wants to do.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    /// Add to, remove from, or clear a cart or favorites list.
    EditCollection,
    /// See every customer's orders (kitchen and admin dashboards).
    ViewAllOrders,
    /// Admin-only screens: menu, staff and user management.
    Administer,
    /// Move `order` to status `to`.
    TransitionOrder { order: &'a Order, to: OrderStatus },
}

/// Why an action was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No one is logged in.
    AuthenticationRequired,
    /// Logged in, but the role does not allow it.
    Unauthorized,
    /// The order belongs to another customer.
    NotOwner,
    /// The lifecycle does not allow this status change.
    IllegalTransition(IllegalTransition),
}

/// Outcome of [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(DenyReason),
}

impl Decision {
    /// Whether the action may proceed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Convert to a `Result` for use with `?`.
    ///
    /// # Errors
    ///
    /// Returns the deny reason if the action was denied.
    pub const fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied(reason) => Err(reason),
        }
    }
}

/// Decide whether `identity` may perform `action`.
#[must_use]
pub fn authorize(identity: Option<&Identity>, action: &Action<'_>) -> Decision {
    let actor = identity.filter(|identity| !identity.acts_as_guest());

    match (*action, actor) {
        (Action::TransitionOrder { order, to }, actor) => authorize_transition(actor, order, to),
        (_, None) => Decision::Denied(DenyReason::AuthenticationRequired),
        (Action::EditCollection, Some(_)) => Decision::Allowed,
        (Action::ViewAllOrders, Some(actor)) if actor.role.is_staff() => Decision::Allowed,
        (Action::Administer, Some(actor)) if actor.role == Role::Admin => Decision::Allowed,
        (Action::ViewAllOrders | Action::Administer, Some(_)) => {
            Decision::Denied(DenyReason::Unauthorized)
        }
    }
}

fn authorize_transition(actor: Option<&Identity>, order: &Order, to: OrderStatus) -> Decision {
    let Some(actor) = actor else {
        return Decision::Denied(DenyReason::Unauthorized);
    };

    let is_cancel = to == OrderStatus::Cancelled;
    if !actor.role.is_staff() {
        if !is_cancel || actor.role != Role::Customer {
            return Decision::Denied(DenyReason::Unauthorized);
        }
        if !order.is_owned_by(actor.id) {
            return Decision::Denied(DenyReason::NotOwner);
        }
    }

    if let Err(illegal) = order.status.validate_transition(to) {
        return Decision::Denied(DenyReason::IllegalTransition(illegal));
    }

    if !actor.role.is_staff() && !CUSTOMER_CANCELLABLE.contains(&order.status) {
        return Decision::Denied(DenyReason::Unauthorized);
    }

    Decision::Allowed
}
