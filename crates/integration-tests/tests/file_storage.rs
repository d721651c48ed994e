//! The JSON file store on a real filesystem.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::sync::Arc;

use bistro_client::ClientState;
use bistro_client::mock::{MockIdentityAuthority, MockOrderAuthority};
use bistro_client::storage::{FileStore, KeyValueStore, SharedStore};
use bistro_integration_tests::{PASSWORD, email, menu, mock_state, secret};

#[test]
fn test_values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let store = FileStore::in_dir(dir.path()).unwrap();
    store.set("cart:7", "[]").unwrap();
    store.set("session.credential", "tok-7-1").unwrap();
    store.remove("session.credential").unwrap();
    drop(store);

    let reopened = FileStore::in_dir(dir.path()).unwrap();
    assert_eq!(reopened.get("cart:7").as_deref(), Some("[]"));
    assert_eq!(reopened.get("session.credential"), None);
}

#[test]
fn test_nested_data_dir_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");

    let store = FileStore::in_dir(&nested).unwrap();
    store.set("k", "v").unwrap();

    assert!(nested.join("storage.json").is_file());
}

#[test]
fn test_corrupt_file_is_replaced_on_next_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    fs::write(&path, "{ not json").unwrap();

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.get("cart:7"), None);

    store.set("favorites:7", "[]").unwrap();
    let on_disk: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, serde_json::json!({ "favorites:7": "[]" }));
}

#[test]
fn test_removing_absent_key_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::in_dir(dir.path()).unwrap();

    store.remove("cart:7").unwrap();

    assert!(!store.path().exists());
}

#[test]
fn test_no_temporary_file_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::in_dir(dir.path()).unwrap();
    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();
    store.remove("a").unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["storage.json"]);
}

#[tokio::test]
async fn test_client_state_restarts_from_disk() {
    let dir = tempfile::tempdir().unwrap();

    let storage: SharedStore = Arc::new(FileStore::in_dir(dir.path()).unwrap());
    let mut state = mock_state(storage, MockOrderAuthority::new());
    state.start().await.unwrap();
    state.login(&email(7), &secret(PASSWORD)).await.unwrap();
    state.cart_mut().add(menu::burger()).unwrap();
    state.cart_mut().set_quantity(&"m1".into(), 3).unwrap();
    state.favorites_mut().add(menu::fries()).unwrap();

    let authority = MockIdentityAuthority::new();
    authority.adopt_tokens_from(state.session().authority());
    drop(state);

    let storage: SharedStore = Arc::new(FileStore::in_dir(dir.path()).unwrap());
    let mut restarted = ClientState::new(storage, authority, MockOrderAuthority::new());
    let identity = restarted.start().await.unwrap().unwrap();

    assert_eq!(identity.id.as_i64(), 7);
    assert_eq!(restarted.cart().quantity_of(&"m1".into()), 3);
    assert!(restarted.favorites().contains(&"m2".into()));

    restarted.logout();
    let reopened = FileStore::in_dir(dir.path()).unwrap();
    assert_eq!(reopened.get("session.credential"), None);
    assert!(reopened.get("cart:7").is_some());
}
