//! Session types.

use bistro_core::{BearerToken, Identity};

/// A bearer token together with the identity it authenticates.
///
/// The two always travel, persist and clear together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: BearerToken,
    pub identity: Identity,
}

/// Where the session store is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Start-up; a stored credential (if any) has not been resolved yet.
    #[default]
    Initializing,
    /// No one is logged in.
    Anonymous,
    /// A resolved, live credential.
    Authenticated(Credential),
}

impl SessionState {
    /// The current identity, if authenticated.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(credential) => Some(&credential.identity),
            Self::Initializing | Self::Anonymous => None,
        }
    }

    /// The current credential, if authenticated.
    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        match self {
            Self::Authenticated(credential) => Some(credential),
            Self::Initializing | Self::Anonymous => None,
        }
    }

    /// Whether start-up resolution is still outstanding.
    #[must_use]
    pub const fn is_initializing(&self) -> bool {
        matches!(self, Self::Initializing)
    }
}
