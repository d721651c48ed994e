//! Session lifecycle across simulated restarts.
//!
//! A "restart" is a new `ClientState` over the same storage, talking to an
//! identity authority that knows the tokens issued before.

#![allow(clippy::unwrap_used)]

use bistro_client::mock::{self, MockIdentityAuthority, MockOrderAuthority};
use bistro_client::models::keys;
use bistro_client::models::SessionState;
use bistro_client::services::{CollectionError, SessionError};
use bistro_client::storage::{KeyValueStore, SharedStore};
use bistro_client::ClientState;
use bistro_core::Role;
use bistro_integration_tests::{PASSWORD, accounts, email, memory_storage, menu, mock_state, secret};

fn restart(
    storage: SharedStore,
    previous: &MockIdentityAuthority,
) -> ClientState<MockIdentityAuthority, MockOrderAuthority> {
    let authority = MockIdentityAuthority::new();
    authority.adopt_tokens_from(previous);
    ClientState::new(storage, authority, MockOrderAuthority::new())
}

// =============================================================================
// Start-up
// =============================================================================

#[tokio::test]
async fn test_fresh_device_starts_anonymous() {
    let (_, storage) = memory_storage();
    let mut state = mock_state(storage, MockOrderAuthority::new());

    assert!(state.session().state().is_initializing());
    assert_eq!(state.start().await.unwrap(), None);
    assert_eq!(state.session().state(), SessionState::Anonymous);
    assert!(state.cart().owner().is_none());
}

#[tokio::test]
async fn test_restart_restores_session_and_collections() {
    let (raw, storage) = memory_storage();
    let mut state = mock_state(storage.clone(), MockOrderAuthority::new());
    state.start().await.unwrap();
    state.login(&email(7), &secret(PASSWORD)).await.unwrap();
    state.cart_mut().add(menu::burger()).unwrap();
    state.favorites_mut().add(menu::family_combo()).unwrap();

    let mut restarted = restart(storage, state.session().authority());
    let identity = restarted.start().await.unwrap().unwrap();

    assert_eq!(identity.id.as_i64(), 7);
    assert_eq!(restarted.cart().total_count(), 1);
    assert!(restarted.favorites().contains(&"b1".into()));
    assert!(raw.get(keys::SESSION_CREDENTIAL).is_some());
}

#[tokio::test]
async fn test_restart_with_revoked_token_starts_anonymous() {
    let (raw, storage) = memory_storage();
    let mut state = mock_state(storage.clone(), MockOrderAuthority::new());
    state.start().await.unwrap();
    state.login(&email(7), &secret(PASSWORD)).await.unwrap();
    state.cart_mut().add(menu::burger()).unwrap();

    let authority = state.session().authority();
    authority.revoke_all();
    let mut restarted = restart(storage, authority);

    assert_eq!(restarted.start().await.unwrap(), None);
    assert!(restarted.cart().is_empty());
    assert!(raw.get(keys::SESSION_CREDENTIAL).is_none());
    assert!(raw.get(keys::SESSION_IDENTITY).is_none());
    // The cart itself waits for the next login.
    assert!(raw.get("cart:7").is_some());
}

#[tokio::test]
async fn test_restart_while_offline_starts_anonymous() {
    let (raw, storage) = memory_storage();
    let mut state = mock_state(storage.clone(), MockOrderAuthority::new());
    state.start().await.unwrap();
    state.login(&email(9), &secret(PASSWORD)).await.unwrap();

    let mut restarted = restart(storage, state.session().authority());
    restarted.session().authority().set_unavailable(true);

    assert_eq!(restarted.start().await.unwrap(), None);
    assert_eq!(restarted.session().state(), SessionState::Anonymous);
    assert!(raw.get(keys::SESSION_CREDENTIAL).is_none());
}

#[tokio::test]
async fn test_restore_picks_up_deactivated_account() {
    let (_, storage) = memory_storage();
    let mut state = mock_state(storage.clone(), MockOrderAuthority::new());
    state.start().await.unwrap();
    state.login(&email(9), &secret(PASSWORD)).await.unwrap();

    let mut deactivated = mock::identity(9, Role::Customer);
    deactivated.is_active = false;
    state.session().authority().update_identity(deactivated);

    let mut restarted = restart(storage, state.session().authority());
    let identity = restarted.start().await.unwrap().unwrap();

    assert!(!identity.is_active);
    assert_eq!(
        restarted.cart_mut().add(menu::fries()),
        Err(CollectionError::AuthenticationRequired)
    );
}

// =============================================================================
// Login, registration, logout
// =============================================================================

#[tokio::test]
async fn test_failed_login_keeps_previous_state() {
    let (raw, storage) = memory_storage();
    let mut state = mock_state(storage, MockOrderAuthority::new());
    state.start().await.unwrap();

    assert_eq!(
        state.login(&email(7), &secret("wrong")).await,
        Err(SessionError::InvalidCredentials)
    );
    assert_eq!(state.session().state(), SessionState::Anonymous);
    assert!(raw.keys().is_empty());

    state.login(&email(7), &secret(PASSWORD)).await.unwrap();
    state.session().authority().set_unavailable(true);
    assert!(matches!(
        state.login(&email(9), &secret(PASSWORD)).await,
        Err(SessionError::NetworkUnavailable(_))
    ));
    assert_eq!(state.session().current().map(|i| i.id.as_i64()), Some(7));
    assert_eq!(state.cart().owner().map(|i| i.id.as_i64()), Some(7));
}

#[tokio::test]
async fn test_register_logs_in_as_customer() {
    let (_, storage) = memory_storage();
    let mut state = mock_state(storage, MockOrderAuthority::new());
    state.start().await.unwrap();

    let identity = state
        .register("Grace", "grace@bistro.test", &secret("pw-grace-1"), Role::Staff)
        .await
        .unwrap();

    assert_eq!(identity.role, Role::Customer);
    assert_eq!(state.cart().owner(), Some(&identity));
    state.cart_mut().add(menu::fries()).unwrap();

    assert!(matches!(
        state
            .register("Grace", "grace@bistro.test", &secret("again"), Role::Customer)
            .await,
        Err(SessionError::ServerRejected(_))
    ));
}

#[tokio::test]
async fn test_logout_forgets_session_but_keeps_collections_on_device() {
    let (raw, storage) = memory_storage();
    let mut state = mock_state(storage, MockOrderAuthority::new());
    state.start().await.unwrap();
    state.login(&email(7), &secret(PASSWORD)).await.unwrap();
    state.cart_mut().add(menu::burger()).unwrap();

    let mut rx = state.session().subscribe();
    state.logout();

    assert_eq!(*rx.borrow_and_update(), SessionState::Anonymous);
    assert_eq!(raw.keys(), vec!["cart:7".to_string()]);

    state.login(&email(7), &secret(PASSWORD)).await.unwrap();
    assert_eq!(state.cart().total_count(), 1);
}

#[tokio::test]
async fn test_accounts_fixture_covers_every_role() {
    let (_, storage) = memory_storage();
    let mut state = ClientState::new(storage, accounts(), MockOrderAuthority::new());
    state.start().await.unwrap();

    for (id, role) in [(1, Role::Admin), (2, Role::Staff), (7, Role::Customer), (9, Role::Customer)] {
        let identity = state.login(&email(id), &secret(PASSWORD)).await.unwrap();
        assert_eq!(identity.role, role);
        assert_eq!(state.cart().owner(), Some(&identity));
    }
}
