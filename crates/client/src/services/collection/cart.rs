//! Cart.

use serde::{Deserialize, Serialize};

use bistro_core::{MenuItem, MenuItemId, Price};

use super::{AddOutcome, CollectionError, CollectionKind, ScopedCollection};
use crate::models::keys;

/// A menu item and how many of it to order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: MenuItem,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.item.unit_price.times(self.quantity)
    }
}

/// Adding an item already in the cart bumps its quantity.
#[derive(Debug)]
pub enum CartKind {}

impl CollectionKind for CartKind {
    const PREFIX: &'static str = keys::CART_PREFIX;

    type Entry = CartLine;

    fn item_id(entry: &CartLine) -> &MenuItemId {
        &entry.item.item_id
    }

    fn admit(item: MenuItem) -> CartLine {
        CartLine { item, quantity: 1 }
    }

    fn merge(existing: &mut CartLine) -> AddOutcome {
        existing.quantity = existing.quantity.saturating_add(1);
        AddOutcome::Incremented
    }

    fn is_valid(entry: &CartLine) -> bool {
        entry.quantity >= 1
    }
}

/// The current identity's cart.
pub type CartStore = ScopedCollection<CartKind>;

impl ScopedCollection<CartKind> {
    /// Set the quantity of a line. Zero removes it; an absent item is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::AuthenticationRequired` when anonymous.
    pub fn set_quantity(&mut self, item_id: &MenuItemId, quantity: u32) -> Result<(), CollectionError> {
        if quantity == 0 {
            return self.remove(item_id);
        }

        let owner = self.authorize()?;
        let Some(line) = self.entries.iter_mut().find(|l| &l.item.item_id == item_id) else {
            return Ok(());
        };
        if line.quantity != quantity {
            line.quantity = quantity;
            self.persist(owner);
        }
        Ok(())
    }

    /// Quantity of one item, 0 if absent.
    #[must_use]
    pub fn quantity_of(&self, item_id: &MenuItemId) -> u32 {
        self.entries
            .iter()
            .find(|l| &l.item.item_id == item_id)
            .map_or(0, |l| l.quantity)
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.entries.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total_value(&self) -> Price {
        self.entries.iter().map(CartLine::subtotal).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use bistro_core::Role;

    use super::*;
    use crate::mock;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn burger() -> MenuItem {
        MenuItem::new("m1", "Burger", Price::from_cents(1299))
    }

    fn fries() -> MenuItem {
        MenuItem::new("m2", "Fries", Price::from_cents(450))
    }

    fn cart_for(id: i64) -> (Arc<MemoryStore>, CartStore) {
        let storage = Arc::new(MemoryStore::new());
        let mut cart = CartStore::new(storage.clone());
        cart.load(Some(&mock::identity(id, Role::Customer)));
        (storage, cart)
    }

    #[test]
    fn test_add_then_increment() {
        let (_, mut cart) = cart_for(7);
        assert_eq!(cart.add(burger()).unwrap(), AddOutcome::Added);
        assert_eq!(cart.add(burger()).unwrap(), AddOutcome::Incremented);
        assert_eq!(cart.add(fries()).unwrap(), AddOutcome::Added);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantity_of(&"m1".into()), 2);
        assert_eq!(cart.total_count(), 3);
        assert_eq!(cart.total_value(), Price::from_cents(3048));
    }

    #[test]
    fn test_anonymous_cannot_add() {
        let storage = Arc::new(MemoryStore::new());
        let mut cart = CartStore::new(storage.clone());
        cart.load(None);

        assert_eq!(cart.add(burger()), Err(CollectionError::AuthenticationRequired));
        assert!(cart.is_empty());
        assert!(storage.keys().is_empty());
    }

    #[test]
    fn test_set_quantity_floor_removes() {
        let (storage, mut cart) = cart_for(7);
        cart.add(burger()).unwrap();

        cart.set_quantity(&"m1".into(), 5).unwrap();
        assert_eq!(cart.total_count(), 5);

        cart.set_quantity(&"m1".into(), 0).unwrap();
        assert!(!cart.contains(&"m1".into()));
        assert_eq!(storage.get("cart:7"), None);

        cart.set_quantity(&"missing".into(), 3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_, mut cart) = cart_for(7);
        cart.add(burger()).unwrap();
        cart.add(fries()).unwrap();

        cart.remove(&"m1".into()).unwrap();
        let after_once: Vec<_> = cart.entries().to_vec();
        cart.remove(&"m1".into()).unwrap();
        assert_eq!(cart.entries(), after_once.as_slice());
    }

    #[test]
    fn test_persisted_shape() {
        let (storage, mut cart) = cart_for(7);
        cart.add(burger()).unwrap();
        cart.add(burger()).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&storage.get("cart:7").unwrap()).unwrap();
        assert_eq!(raw[0]["itemId"], "m1");
        assert_eq!(raw[0]["unitPrice"], "12.99");
        assert_eq!(raw[0]["quantity"], 2);
    }

    #[test]
    fn test_clear_only_touches_own_key() {
        let (storage, mut cart) = cart_for(7);
        storage.set("cart:9", r#"[{"itemId":"m2","name":"Fries","unitPrice":"4.50","quantity":1}]"#).unwrap();
        cart.add(burger()).unwrap();

        cart.clear().unwrap();
        assert!(cart.is_empty());
        assert_eq!(storage.get("cart:7"), None);
        assert!(storage.get("cart:9").is_some());
    }

    #[test]
    fn test_write_failure_keeps_memory() {
        let (storage, mut cart) = cart_for(7);
        storage.set_read_only(true);

        assert_eq!(cart.add(burger()).unwrap(), AddOutcome::Added);
        assert!(cart.contains(&"m1".into()));

        storage.set_read_only(false);
        assert_eq!(storage.get("cart:7"), None);
    }

    #[test]
    fn test_corrupt_cart_loads_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage.set("cart:7", "[{\"itemId\":").unwrap();

        let mut cart = CartStore::new(storage.clone());
        cart.load(Some(&mock::identity(7, Role::Customer)));
        assert!(cart.is_empty());
        assert_eq!(storage.get("cart:7"), None);
    }

    #[test]
    fn test_load_drops_empty_and_repeated_lines() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set(
                "cart:7",
                r#"[
                    {"itemId":"m1","name":"Burger","unitPrice":"12.99","quantity":2},
                    {"itemId":"m2","name":"Fries","unitPrice":"4.50","quantity":0},
                    {"itemId":"m1","name":"Burger","unitPrice":"12.99","quantity":5}
                ]"#,
            )
            .unwrap();

        let mut cart = CartStore::new(storage.clone());
        cart.load(Some(&mock::identity(7, Role::Customer)));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(&"m1".into()), 2);
        assert!(!cart.contains(&"m2".into()));

        let raw: serde_json::Value = serde_json::from_str(&storage.get("cart:7").unwrap()).unwrap();
        assert_eq!(raw.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_load_with_only_invalid_lines_removes_key() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set("cart:7", r#"[{"itemId":"m2","name":"Fries","unitPrice":"4.50","quantity":0}]"#)
            .unwrap();

        let mut cart = CartStore::new(storage.clone());
        cart.load(Some(&mock::identity(7, Role::Customer)));

        assert!(cart.is_empty());
        assert_eq!(storage.get("cart:7"), None);
    }
}
