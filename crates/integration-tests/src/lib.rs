//! Integration tests for Bistro.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bistro-integration-tests
//! ```
//!
//! No external services are needed: the session and order tests run against
//! the in-memory authorities from `bistro-client`'s `test-util` feature, and
//! the HTTP tests start [`backend::MockBackend`] on an ephemeral port.
//!
//! # Test Categories
//!
//! - `session_lifecycle` - Login, restore, logout across simulated restarts
//! - `identity_isolation` - Carts and favorites never leak between identities
//! - `order_transitions` - Lifecycle and role rules through the order desk
//! - `file_storage` - The JSON file store on a real filesystem
//! - `api_client` - The REST client against a mock backend

pub mod backend;

use std::sync::Arc;

use secrecy::SecretString;

use bistro_client::ClientState;
use bistro_client::mock::{self, MockIdentityAuthority, MockOrderAuthority};
use bistro_client::storage::{MemoryStore, SharedStore};
use bistro_core::{MenuItem, Price, Role};

/// Client state wired to in-memory authorities.
pub type MockState = ClientState<MockIdentityAuthority, MockOrderAuthority>;

/// Password of every account from [`accounts`].
pub const PASSWORD: &str = "correct-horse";

/// Wrap a password.
#[must_use]
pub fn secret(password: &str) -> SecretString {
    SecretString::from(password.to_owned())
}

/// Email of the fixture account with `id`.
#[must_use]
pub fn email(id: i64) -> String {
    format!("user{id}@bistro.test")
}

/// Identity authority with an admin (1), a staff member (2) and two
/// customers (7, 9), all using [`PASSWORD`].
#[must_use]
pub fn accounts() -> MockIdentityAuthority {
    MockIdentityAuthority::new()
        .with_account(mock::identity(1, Role::Admin), PASSWORD)
        .with_account(mock::identity(2, Role::Staff), PASSWORD)
        .with_account(mock::identity(7, Role::Customer), PASSWORD)
        .with_account(mock::identity(9, Role::Customer), PASSWORD)
}

/// Fresh memory storage, returned both concrete and as a shared handle.
#[must_use]
pub fn memory_storage() -> (Arc<MemoryStore>, SharedStore) {
    let storage = Arc::new(MemoryStore::new());
    let shared: SharedStore = storage.clone();
    (storage, shared)
}

/// Client state over `storage` with [`accounts`] and the given orders.
#[must_use]
pub fn mock_state(storage: SharedStore, orders: MockOrderAuthority) -> MockState {
    ClientState::new(storage, accounts(), orders)
}

/// Menu items used across tests.
pub mod menu {
    use super::{MenuItem, Price};

    #[must_use]
    pub fn burger() -> MenuItem {
        MenuItem::new("m1", "Classic Burger", Price::from_cents(1299))
    }

    #[must_use]
    pub fn fries() -> MenuItem {
        MenuItem::new("m2", "Fries", Price::from_cents(450))
    }

    #[must_use]
    pub fn family_combo() -> MenuItem {
        MenuItem {
            is_bundle: true,
            image_ref: "/img/combo.png".to_string(),
            ..MenuItem::new("b1", "Family Combo", Price::from_cents(3999))
        }
    }
}
