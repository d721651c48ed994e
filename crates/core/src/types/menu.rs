//! Menu item summaries held in carts and favorites lists.

use serde::{Deserialize, Serialize};

use crate::{MenuItemId, Price};

/// The parts of a menu item a client keeps locally.
///
/// This is what the menu page hands to the cart and favorites stores; the
/// full menu record stays with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Menu item ID, unique within one collection.
    pub item_id: MenuItemId,
    /// Display name.
    pub name: String,
    /// Price of one unit.
    pub unit_price: Price,
    /// Image URL or asset path.
    #[serde(default)]
    pub image_ref: String,
    /// Whether this is a bundle (combo) rather than a single dish.
    #[serde(default)]
    pub is_bundle: bool,
}

impl MenuItem {
    /// Create a non-bundle menu item without an image.
    #[must_use]
    pub fn new(item_id: impl Into<MenuItemId>, name: impl Into<String>, unit_price: Price) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            unit_price,
            image_ref: String::new(),
            is_bundle: false,
        }
    }
}
