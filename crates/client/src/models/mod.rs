//! Client-side state types.

pub mod session;

pub use session::{Credential, SessionState};

/// Storage keys and key builders.
pub mod keys {
    use bistro_core::UserId;

    /// Raw bearer token of the persisted session.
    pub const SESSION_CREDENTIAL: &str = "session.credential";

    /// JSON identity of the persisted session.
    pub const SESSION_IDENTITY: &str = "session.identity";

    /// Key prefix for carts.
    pub const CART_PREFIX: &str = "cart";

    /// Key prefix for favorites lists.
    pub const FAVORITES_PREFIX: &str = "favorites";

    /// Identity-scoped key, e.g. `cart:7`.
    #[must_use]
    pub fn scoped(prefix: &str, owner: UserId) -> String {
        format!("{prefix}:{owner}")
    }
}

#[cfg(test)]
mod tests {
    use super::keys;
    use bistro_core::UserId;

    #[test]
    fn test_scoped_keys() {
        assert_eq!(keys::scoped(keys::CART_PREFIX, UserId::new(7)), "cart:7");
        assert_eq!(
            keys::scoped(keys::FAVORITES_PREFIX, UserId::new(9)),
            "favorites:9"
        );
    }
}
