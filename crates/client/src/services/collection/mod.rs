//! Identity-scoped collections.
//!
//! A cart and a favorites list behave the same way: an ordered list of menu
//! items, unique by item ID, persisted under `{prefix}:{user_id}` for the
//! identity that owns it. They differ in the entry type and in what adding
//! an item twice does, which [`CollectionKind`] captures.
//!
//! # Scoping
//!
//! [`ScopedCollection::load`] replaces the whole in-memory list with the one
//! stored for the new owner. No entry of the previous owner survives it, and
//! no mutation can reach another owner's key: every mutator snapshots the
//! owner ID before touching anything and writes under that ID only.

mod cart;
mod favorites;

pub use cart::{CartKind, CartLine, CartStore};
pub use favorites::{FavoritesKind, FavoritesStore};

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use bistro_core::{Identity, MenuItem, MenuItemId, UserId};

use crate::models::keys;
use crate::services::gate::{self, Action};
use crate::storage::{self, SharedStore};

/// Errors from collection mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// Nobody is logged in, so there is nowhere to keep the change.
    #[error("log in to save items")]
    AuthenticationRequired,
}

/// What [`ScopedCollection::add`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The item was appended.
    Added,
    /// The item was already there; its quantity went up by one.
    Incremented,
    /// The item was already there; nothing changed.
    AlreadyPresent,
}

/// How one kind of collection stores and merges its entries.
pub trait CollectionKind {
    /// Storage key prefix.
    const PREFIX: &'static str;

    /// Stored entry.
    type Entry: Clone + fmt::Debug + Serialize + DeserializeOwned;

    /// Item ID of an entry.
    fn item_id(entry: &Self::Entry) -> &MenuItemId;

    /// Entry for a newly added item.
    fn admit(item: MenuItem) -> Self::Entry;

    /// Apply a repeated add of an item already present.
    fn merge(existing: &mut Self::Entry) -> AddOutcome;

    /// Whether a stored entry may be loaded.
    fn is_valid(_entry: &Self::Entry) -> bool {
        true
    }
}

/// Ordered, per-identity collection of menu items.
pub struct ScopedCollection<K: CollectionKind> {
    storage: SharedStore,
    owner: Option<Identity>,
    entries: Vec<K::Entry>,
    kind: PhantomData<K>,
}

impl<K: CollectionKind> fmt::Debug for ScopedCollection<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedCollection")
            .field("prefix", &K::PREFIX)
            .field("owner", &self.owner.as_ref().map(|o| o.id))
            .field("entries", &self.entries)
            .finish()
    }
}

impl<K: CollectionKind> ScopedCollection<K> {
    /// Create an empty collection with no owner.
    #[must_use]
    pub fn new(storage: SharedStore) -> Self {
        Self {
            storage,
            owner: None,
            entries: Vec::new(),
            kind: PhantomData,
        }
    }

    /// Switch to `owner`'s collection.
    ///
    /// `None` (or a guest identity) empties the collection without reading
    /// storage. A stored value that does not decode is removed and the
    /// collection starts empty. Invalid entries and repeated item IDs are
    /// dropped (the first occurrence wins) and the cleaned list is saved.
    pub fn load(&mut self, owner: Option<&Identity>) {
        self.owner = owner.filter(|identity| !identity.acts_as_guest()).cloned();
        self.entries = Vec::new();

        if let Some(owner) = self.owner.as_ref().map(|o| o.id) {
            let key = keys::scoped(K::PREFIX, owner);
            let stored: Vec<K::Entry> = storage::read_json(&*self.storage, &key).unwrap_or_default();
            let total = stored.len();
            for entry in stored {
                if K::is_valid(&entry) && self.position(K::item_id(&entry)).is_none() {
                    self.entries.push(entry);
                }
            }
            if self.entries.len() != total {
                tracing::warn!(
                    key,
                    dropped = total - self.entries.len(),
                    "Stored collection had invalid or repeated entries, dropping them"
                );
                self.persist(owner);
            }
        }

        tracing::debug!(
            prefix = K::PREFIX,
            owner = ?self.owner.as_ref().map(|o| o.id),
            entries = self.entries.len(),
            "Loaded collection"
        );
    }

    /// Add an item, or merge it with the entry already present.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::AuthenticationRequired` when anonymous.
    pub fn add(&mut self, item: MenuItem) -> Result<AddOutcome, CollectionError> {
        let owner = self.authorize()?;

        let outcome = match self.position(&item.item_id) {
            Some(index) => match self.entries.get_mut(index) {
                Some(existing) => K::merge(existing),
                None => AddOutcome::AlreadyPresent,
            },
            None => {
                self.entries.push(K::admit(item));
                AddOutcome::Added
            }
        };

        if outcome != AddOutcome::AlreadyPresent {
            self.persist(owner);
        }
        Ok(outcome)
    }

    /// Remove an item. Removing an absent item is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::AuthenticationRequired` when anonymous.
    pub fn remove(&mut self, item_id: &MenuItemId) -> Result<(), CollectionError> {
        let owner = self.authorize()?;
        if let Some(index) = self.position(item_id) {
            self.entries.remove(index);
            self.persist(owner);
        }
        Ok(())
    }

    /// Remove every item and the stored value.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::AuthenticationRequired` when anonymous.
    pub fn clear(&mut self) -> Result<(), CollectionError> {
        let owner = self.authorize()?;
        self.entries.clear();
        self.persist(owner);
        Ok(())
    }

    /// Whether an item is present.
    #[must_use]
    pub fn contains(&self, item_id: &MenuItemId) -> bool {
        self.position(item_id).is_some()
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[K::Entry] {
        &self.entries
    }

    /// Number of distinct items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identity whose collection is loaded.
    #[must_use]
    pub const fn owner(&self) -> Option<&Identity> {
        self.owner.as_ref()
    }

    fn position(&self, item_id: &MenuItemId) -> Option<usize> {
        self.entries.iter().position(|e| K::item_id(e) == item_id)
    }

    /// Check the gate and snapshot the owner ID.
    fn authorize(&self) -> Result<UserId, CollectionError> {
        gate::authorize(self.owner.as_ref(), &Action::EditCollection)
            .into_result()
            .map_err(|_| CollectionError::AuthenticationRequired)?;
        self.owner
            .as_ref()
            .map(|owner| owner.id)
            .ok_or(CollectionError::AuthenticationRequired)
    }

    /// Write the whole collection under `owner`. Failures are logged and the
    /// in-memory change is kept.
    fn persist(&self, owner: UserId) {
        let key = keys::scoped(K::PREFIX, owner);
        let written = if self.entries.is_empty() {
            self.storage.remove(&key)
        } else {
            storage::write_json(&*self.storage, &key, &self.entries)
        };

        match written {
            Ok(()) => tracing::debug!(key, entries = self.entries.len(), "Saved collection"),
            Err(err) => {
                tracing::warn!(key, error = %err, "Could not save collection, change kept in memory only");
            }
        }
    }
}
