//! Favorites.

use bistro_core::{MenuItem, MenuItemId};

use super::{AddOutcome, CollectionError, CollectionKind, ScopedCollection};
use crate::models::keys;

/// Adding an item already favorited changes nothing.
#[derive(Debug)]
pub enum FavoritesKind {}

impl CollectionKind for FavoritesKind {
    const PREFIX: &'static str = keys::FAVORITES_PREFIX;

    type Entry = MenuItem;

    fn item_id(entry: &MenuItem) -> &MenuItemId {
        &entry.item_id
    }

    fn admit(item: MenuItem) -> MenuItem {
        item
    }

    fn merge(_existing: &mut MenuItem) -> AddOutcome {
        AddOutcome::AlreadyPresent
    }
}

/// The current identity's favorites.
pub type FavoritesStore = ScopedCollection<FavoritesKind>;

impl ScopedCollection<FavoritesKind> {
    /// Add the item if absent, remove it if present.
    ///
    /// Returns whether the item is a favorite afterwards.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::AuthenticationRequired` when anonymous.
    pub fn toggle(&mut self, item: MenuItem) -> Result<bool, CollectionError> {
        if self.contains(&item.item_id) {
            self.remove(&item.item_id)?;
            Ok(false)
        } else {
            self.add(item)?;
            Ok(true)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use bistro_core::{Price, Role};

    use super::*;
    use crate::mock;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn salad() -> MenuItem {
        MenuItem::new("m3", "Salad", Price::from_cents(899))
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let storage = Arc::new(MemoryStore::new());
        let mut favorites = FavoritesStore::new(storage.clone());
        favorites.load(Some(&mock::identity(7, Role::Customer)));

        assert_eq!(favorites.add(salad()).unwrap(), AddOutcome::Added);
        assert_eq!(favorites.add(salad()).unwrap(), AddOutcome::AlreadyPresent);
        assert_eq!(favorites.len(), 1);
        assert!(storage.get("favorites:7").is_some());
    }

    #[test]
    fn test_toggle() {
        let storage = Arc::new(MemoryStore::new());
        let mut favorites = FavoritesStore::new(storage.clone());
        favorites.load(Some(&mock::identity(7, Role::Customer)));

        assert!(favorites.toggle(salad()).unwrap());
        assert!(favorites.contains(&"m3".into()));
        assert!(!favorites.toggle(salad()).unwrap());
        assert!(favorites.is_empty());
        assert_eq!(storage.get("favorites:7"), None);
    }

    #[test]
    fn test_guest_is_anonymous() {
        let storage = Arc::new(MemoryStore::new());
        storage.set("favorites:5", r#"[{"itemId":"m3","name":"Salad","unitPrice":"8.99"}]"#).unwrap();

        let mut favorites = FavoritesStore::new(storage.clone());
        favorites.load(Some(&mock::identity(5, Role::Guest)));

        assert!(favorites.is_empty());
        assert!(favorites.owner().is_none());
        assert_eq!(favorites.toggle(salad()), Err(CollectionError::AuthenticationRequired));
    }
}
