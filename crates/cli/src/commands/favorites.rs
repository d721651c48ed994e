//! Favorites commands.

use bistro_client::ClientError;
use bistro_client::services::AddOutcome;
use bistro_core::{MenuItem, MenuItemId};

use super::App;

#[allow(clippy::print_stdout)]
pub fn show(app: &App) {
    let favorites = app.favorites();
    if favorites.owner().is_none() {
        println!("Log in to see favorites");
        return;
    }
    if favorites.is_empty() {
        println!("No favorites yet");
    }
    for item in favorites.entries() {
        let bundle = if item.is_bundle { " (bundle)" } else { "" };
        println!("{:<12} {}{bundle} {}", item.item_id, item.name, item.unit_price);
    }
}

/// # Errors
///
/// Returns `ClientError::Collection` when nobody is logged in.
#[allow(clippy::print_stdout)]
pub fn add(app: &mut App, item: MenuItem) -> Result<(), ClientError> {
    let item_id = item.item_id.clone();
    match app.favorites_mut().add(item)? {
        AddOutcome::AlreadyPresent => println!("{item_id} is already a favorite"),
        AddOutcome::Added | AddOutcome::Incremented => println!("Added {item_id}"),
    }
    Ok(())
}

/// # Errors
///
/// Returns `ClientError::Collection` when nobody is logged in.
pub fn remove(app: &mut App, item_id: &MenuItemId) -> Result<(), ClientError> {
    app.favorites_mut().remove(item_id)?;
    Ok(())
}

/// # Errors
///
/// Returns `ClientError::Collection` when nobody is logged in.
#[allow(clippy::print_stdout)]
pub fn toggle(app: &mut App, item: MenuItem) -> Result<(), ClientError> {
    let item_id = item.item_id.clone();
    if app.favorites_mut().toggle(item)? {
        println!("Added {item_id}");
    } else {
        println!("Removed {item_id}");
    }
    Ok(())
}

/// # Errors
///
/// Returns `ClientError::Collection` when nobody is logged in.
pub fn clear(app: &mut App) -> Result<(), ClientError> {
    app.favorites_mut().clear()?;
    Ok(())
}
