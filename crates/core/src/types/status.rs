//! Order status lifecycle.
//!
//! Orders move along a fixed happy path and may be cancelled at any point
//! before they reach a terminal state:
//!
//! ```text
//! PENDING -> CONFIRMED -> PREPARING -> READY -> DELIVERED
//!    |           |            |          |
//!    +-----------+------------+----------+----> CANCELLED
//! ```
//!
//! Everything here is pure: dashboards call these functions while rendering,
//! and the order desk calls [`OrderStatus::validate_transition`] before it
//! talks to the backend.

use serde::{Deserialize, Serialize};

/// Status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

/// A status change that the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal order transition {from} -> {to}")]
pub struct IllegalTransition {
    /// Status the order is in.
    pub from: OrderStatus,
    /// Status that was requested.
    pub to: OrderStatus,
}

impl OrderStatus {
    /// The happy path, in order.
    pub const HAPPY_PATH: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
        Self::Delivered,
    ];

    /// Every status, happy path first.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// No transition leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Immediate successor on the happy path.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::Preparing),
            Self::Preparing => Some(Self::Ready),
            Self::Ready => Some(Self::Delivered),
            Self::Delivered | Self::Cancelled => None,
        }
    }

    /// Position on the happy path, `None` for `Cancelled`.
    #[must_use]
    pub fn stage_index(self) -> Option<usize> {
        Self::HAPPY_PATH.iter().position(|s| *s == self)
    }

    /// Whether moving from `self` to `to` is allowed.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Cancelled || self.next() == Some(to)
    }

    /// Check a transition, naming the pair on failure.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalTransition`] when `to` skips a stage, moves backwards,
    /// repeats the current status, or leaves a terminal status.
    pub fn validate_transition(self, to: Self) -> Result<(), IllegalTransition> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(IllegalTransition { from: self, to })
        }
    }

    /// Dashboard progress in `[0, 1]`: `index / (len - 1)` along the happy path.
    ///
    /// Cancelled orders have no progress.
    ///
    /// ```
    /// use bistro_core::OrderStatus;
    ///
    /// assert_eq!(OrderStatus::Pending.progress(), Some(0.0));
    /// assert_eq!(OrderStatus::Preparing.progress(), Some(0.5));
    /// assert_eq!(OrderStatus::Delivered.progress(), Some(1.0));
    /// assert_eq!(OrderStatus::Cancelled.progress(), None);
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // indices are < 5
    pub fn progress(self) -> Option<f64> {
        self.stage_index()
            .map(|i| i as f64 / (Self::HAPPY_PATH.len() - 1) as f64)
    }

    /// Wire name, e.g. `PREPARING`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    DineIn,
    Takeaway,
    Delivery,
}
