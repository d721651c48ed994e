//! Unified error handling.
//!
//! Each component has its own error enum; `ClientError` gathers them for
//! front ends that drive several components. [`ClientError::user_message`]
//! gives the text to show a user, without internal details.

use thiserror::Error;

use crate::config::ConfigError;
use crate::services::{CollectionError, OrderError, SessionError};
use crate::storage::StorageError;

/// Client-level error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Login, registration or session restore failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Cart or favorites change was refused.
    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    /// Order read or transition failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Device storage could not be opened or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Requested item or order does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ClientError {
    /// Whether this is a fault of the client or its environment rather than
    /// a refusal the user can act on. Front ends report these.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Storage(_)
                | Self::Config(_)
                | Self::Http(_)
                | Self::Session(SessionError::ServerRejected(_))
                | Self::Order(OrderError::ServerRejected(_))
        )
    }

    /// Message safe to show to a user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Session(err) => match err {
                SessionError::InvalidCredentials => "Invalid email or password".to_string(),
                SessionError::NetworkUnavailable(_) => {
                    "Cannot reach the server, check your connection".to_string()
                }
                SessionError::ServerRejected(_) => "The server could not complete the request".to_string(),
                SessionError::Busy => "Please wait for the current request to finish".to_string(),
                SessionError::Superseded => "Session changed, please try again".to_string(),
            },
            Self::Collection(CollectionError::AuthenticationRequired) => {
                "Log in to save items".to_string()
            }
            Self::Order(err) => match err {
                OrderError::IllegalTransition { from, to } => {
                    format!("An order that is {from} cannot become {to}")
                }
                OrderError::Unauthorized => "You are not allowed to do that".to_string(),
                OrderError::NotOwner => "That order belongs to someone else".to_string(),
                OrderError::AuthenticationRequired => "Log in to see your orders".to_string(),
                OrderError::NetworkUnavailable(_) => {
                    "Cannot reach the server, check your connection".to_string()
                }
                OrderError::ServerRejected(_) => "The server could not complete the request".to_string(),
            },
            Self::Storage(_) => "Could not access local storage".to_string(),
            Self::Config(err) => err.to_string(),
            Self::Http(_) => "Internal error".to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use bistro_core::OrderStatus;

    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::from(SessionError::Busy);
        assert_eq!(
            err.to_string(),
            "Session error: another session request is in progress"
        );

        let err = ClientError::NotFound("order 31".to_string());
        assert_eq!(err.to_string(), "Not found: order 31");
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = ClientError::from(SessionError::ServerRejected("500: stack trace".to_string()));
        assert!(!err.user_message().contains("stack trace"));
        assert!(err.is_internal());

        let err = ClientError::from(OrderError::NetworkUnavailable("dns error".to_string()));
        assert!(!err.user_message().contains("dns"));
        assert!(!err.is_internal());
    }

    #[test]
    fn test_user_message_for_refusals() {
        let err = ClientError::from(OrderError::IllegalTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        });
        assert_eq!(
            err.user_message(),
            "An order that is DELIVERED cannot become CANCELLED"
        );
        assert_eq!(
            ClientError::from(CollectionError::AuthenticationRequired).user_message(),
            "Log in to save items"
        );
    }
}
