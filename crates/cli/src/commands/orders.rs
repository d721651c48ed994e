//! Order commands.

use bistro_client::ClientError;
use bistro_client::services::orders::progress;
use bistro_core::{Order, OrderId, OrderStatus};

use super::App;

/// Print every order visible to the logged-in identity.
///
/// # Errors
///
/// Returns `ClientError::Order` if nobody is logged in or the backend fails.
#[allow(clippy::print_stdout)]
pub async fn list(app: &App) -> Result<(), ClientError> {
    let orders = app.fetch_orders().await?;
    if orders.is_empty() {
        println!("No orders");
    }
    for order in &orders {
        print_order(order);
    }
    Ok(())
}

/// Move an order to `to`.
///
/// The order is looked up first so the transition is checked against its
/// current status.
///
/// # Errors
///
/// Returns `ClientError::NotFound` if the order is not visible, or
/// `ClientError::Order` if the transition is refused.
pub async fn transition(app: &App, id: OrderId, to: OrderStatus) -> Result<(), ClientError> {
    let orders = app.fetch_orders().await?;
    let order = orders
        .iter()
        .find(|order| order.id == id)
        .ok_or_else(|| ClientError::NotFound(format!("order {id}")))?;

    let updated = app.transition_order(order, to).await?;
    print_order(&updated);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_order(order: &Order) {
    let stage = progress(order).map_or_else(
        || "-".to_string(),
        |p| format!("{:.0}%", p * 100.0),
    );
    println!(
        "#{:<6} {:<10} {:>5} customer {:<6} {:>9} {}",
        order.id,
        order.status.as_str(),
        stage,
        order.customer_id,
        order.total().to_string(),
        order.created_at.format("%Y-%m-%d %H:%M")
    );
}
