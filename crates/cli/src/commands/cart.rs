//! Cart commands.

use bistro_client::ClientError;
use bistro_client::services::AddOutcome;
use bistro_core::{MenuItem, MenuItemId};

use super::App;

#[allow(clippy::print_stdout)]
pub fn show(app: &App) {
    let cart = app.cart();
    if cart.owner().is_none() {
        println!("Log in to use the cart");
        return;
    }
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }

    for line in cart.entries() {
        println!(
            "{:<12} {:<24} {:>3} x {:>8} = {:>9}",
            line.item.item_id,
            line.item.name,
            line.quantity,
            line.item.unit_price.to_string(),
            line.subtotal().to_string()
        );
    }
    println!("{} items, total {}", cart.total_count(), cart.total_value());
}

/// # Errors
///
/// Returns `ClientError::Collection` when nobody is logged in.
#[allow(clippy::print_stdout)]
pub fn add(app: &mut App, item: MenuItem) -> Result<(), ClientError> {
    let item_id = item.item_id.clone();
    let outcome = app.cart_mut().add(item)?;
    let quantity = app.cart().quantity_of(&item_id);
    match outcome {
        AddOutcome::Added => println!("Added {item_id}"),
        AddOutcome::Incremented | AddOutcome::AlreadyPresent => {
            println!("{item_id} now x{quantity}");
        }
    }
    Ok(())
}

/// # Errors
///
/// Returns `ClientError::Collection` when nobody is logged in.
pub fn remove(app: &mut App, item_id: &MenuItemId) -> Result<(), ClientError> {
    app.cart_mut().remove(item_id)?;
    Ok(())
}

/// # Errors
///
/// Returns `ClientError::NotFound` if the item is not in the cart, or
/// `ClientError::Collection` when nobody is logged in.
pub fn set_quantity(app: &mut App, item_id: &MenuItemId, quantity: u32) -> Result<(), ClientError> {
    if quantity > 0 && app.cart().owner().is_some() && !app.cart().contains(item_id) {
        return Err(ClientError::NotFound(format!("{item_id} in cart")));
    }
    app.cart_mut().set_quantity(item_id, quantity)?;
    Ok(())
}

/// # Errors
///
/// Returns `ClientError::Collection` when nobody is logged in.
pub fn clear(app: &mut App) -> Result<(), ClientError> {
    app.cart_mut().clear()?;
    Ok(())
}
