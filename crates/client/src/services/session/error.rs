//! Session error types.

use thiserror::Error;

use crate::authority::AuthorityError;

/// Errors that can occur during session transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Wrong email/password, malformed email, or a revoked token.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The identity authority could not be reached or timed out.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The identity authority refused the request for another reason.
    #[error("server rejected request: {0}")]
    ServerRejected(String),

    /// Another login, registration or start-up resolution is in flight.
    #[error("another session request is in progress")]
    Busy,

    /// The session changed (e.g. logout) while this request was in flight;
    /// its result was discarded.
    #[error("session changed while the request was in flight")]
    Superseded,
}

impl From<AuthorityError> for SessionError {
    fn from(err: AuthorityError) -> Self {
        match err {
            AuthorityError::Unauthenticated => Self::InvalidCredentials,
            AuthorityError::Unavailable(msg) => Self::NetworkUnavailable(msg),
            AuthorityError::Rejected { status, message } => {
                Self::ServerRejected(format!("{status}: {message}"))
            }
        }
    }
}
