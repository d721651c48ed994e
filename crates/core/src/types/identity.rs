//! The authenticated user record.

use serde::{Deserialize, Serialize};

use crate::{Email, Role, UserId};

/// An authenticated user, as reported by the identity authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Backend user ID. Collection storage keys embed this value.
    pub id: UserId,
    /// Name shown in greetings and dashboards.
    pub display_name: String,
    /// Login email.
    pub email: Email,
    /// Assigned role.
    pub role: Role,
    /// Deactivated accounts keep their identity but may not act.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl Identity {
    /// Whether this identity has no more rights than an anonymous visitor.
    ///
    /// Guests and deactivated accounts fall in this bucket.
    #[must_use]
    pub const fn acts_as_guest(&self) -> bool {
        !self.is_active || matches!(self.role, Role::Guest)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(role: Role, is_active: bool) -> Identity {
        Identity {
            id: UserId::new(7),
            display_name: "Ada".to_string(),
            email: Email::parse("ada@bistro.io").unwrap(),
            role,
            is_active,
        }
    }

    #[test]
    fn test_acts_as_guest() {
        assert!(identity(Role::Guest, true).acts_as_guest());
        assert!(identity(Role::Admin, false).acts_as_guest());
        assert!(!identity(Role::Customer, true).acts_as_guest());
    }

    #[test]
    fn test_wire_format() {
        let json = r#"{"id":7,"displayName":"Ada","email":"ada@bistro.io","role":"CUSTOMER"}"#;
        let parsed: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, identity(Role::Customer, true));

        let out = serde_json::to_value(&parsed).unwrap();
        assert_eq!(out["displayName"], "Ada");
        assert_eq!(out["isActive"], true);
    }
}
