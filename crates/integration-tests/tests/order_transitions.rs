//! Order lifecycle and role rules through the client state.

#![allow(clippy::unwrap_used)]

use bistro_client::mock::{self, MockOrderAuthority};
use bistro_client::services::gate::{Action, Decision, DenyReason};
use bistro_client::services::OrderError;
use bistro_core::{OrderId, OrderStatus};
use bistro_integration_tests::{MockState, PASSWORD, email, memory_storage, mock_state, secret};

async fn logged_in(id: i64, orders: MockOrderAuthority) -> MockState {
    let (_, storage) = memory_storage();
    let mut state = mock_state(storage, orders);
    state.start().await.unwrap();
    state.login(&email(id), &secret(PASSWORD)).await.unwrap();
    state
}

fn expected_legal(from: OrderStatus, to: OrderStatus) -> bool {
    let successor = OrderStatus::HAPPY_PATH
        .windows(2)
        .any(|pair| pair == [from, to]);
    let cancel = to == OrderStatus::Cancelled
        && !matches!(from, OrderStatus::Delivered | OrderStatus::Cancelled);
    successor || cancel
}

#[tokio::test]
async fn test_staff_transitions_over_all_pairs() {
    for from in OrderStatus::ALL {
        for to in OrderStatus::ALL {
            let orders = MockOrderAuthority::new().with_orders([mock::order(1, 7, from)]);
            let state = logged_in(2, orders).await;
            let order = state.orders().authority().order(OrderId::new(1)).unwrap();

            let result = state.transition_order(&order, to).await;
            if expected_legal(from, to) {
                assert_eq!(result.unwrap().status, to, "{from} -> {to}");
            } else {
                assert_eq!(
                    result,
                    Err(OrderError::IllegalTransition { from, to }),
                    "{from} -> {to}"
                );
                assert_eq!(state.orders().authority().transition_calls(), 0);
            }
        }
    }
}

#[tokio::test]
async fn test_customer_cannot_advance_any_order() {
    let orders = MockOrderAuthority::new().with_orders([
        mock::order(1, 7, OrderStatus::Confirmed),
        mock::order(2, 9, OrderStatus::Confirmed),
    ]);
    let state = logged_in(7, orders).await;

    for id in [1, 2] {
        let order = state.orders().authority().order(OrderId::new(id)).unwrap();
        assert_eq!(
            state.transition_order(&order, OrderStatus::Preparing).await,
            Err(OrderError::Unauthorized)
        );
    }
    assert_eq!(state.orders().authority().transition_calls(), 0);
}

#[tokio::test]
async fn test_customer_cancel_window() {
    let orders = MockOrderAuthority::new().with_orders([
        mock::order(1, 7, OrderStatus::Pending),
        mock::order(2, 7, OrderStatus::Confirmed),
        mock::order(3, 7, OrderStatus::Preparing),
        mock::order(4, 9, OrderStatus::Pending),
    ]);
    let state = logged_in(7, orders).await;
    let order = |id| state.orders().authority().order(OrderId::new(id)).unwrap();

    let cancelled = state.transition_order(&order(1), OrderStatus::Cancelled).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(state.transition_order(&order(2), OrderStatus::Cancelled).await.is_ok());

    assert_eq!(
        state.transition_order(&order(3), OrderStatus::Cancelled).await,
        Err(OrderError::Unauthorized)
    );
    assert_eq!(
        state.transition_order(&order(4), OrderStatus::Cancelled).await,
        Err(OrderError::NotOwner)
    );
    assert_eq!(state.orders().authority().transition_calls(), 2);
}

#[tokio::test]
async fn test_customer_list_is_filtered() {
    let orders = MockOrderAuthority::new().with_orders([
        mock::order(1, 7, OrderStatus::Pending),
        mock::order(2, 9, OrderStatus::Ready),
    ]);
    let state = logged_in(7, orders).await;
    state.orders().authority().leak_all_orders(true);

    let visible = state.fetch_orders().await.unwrap();
    assert_eq!(visible.len(), 1);
    assert!(visible.iter().all(|o| o.customer_id.as_i64() == 7));
}

#[tokio::test]
async fn test_anonymous_has_no_orders() {
    let (_, storage) = memory_storage();
    let orders = MockOrderAuthority::new().with_orders([mock::order(1, 7, OrderStatus::Pending)]);
    let mut state = mock_state(storage, orders);
    state.start().await.unwrap();

    assert_eq!(state.fetch_orders().await, Err(OrderError::AuthenticationRequired));

    let order = state.orders().authority().order(OrderId::new(1)).unwrap();
    assert_eq!(
        state.transition_order(&order, OrderStatus::Cancelled).await,
        Err(OrderError::Unauthorized)
    );
}

#[tokio::test]
async fn test_dashboards_by_role() {
    let admin = logged_in(1, MockOrderAuthority::new()).await;
    let staff = logged_in(2, MockOrderAuthority::new()).await;
    let customer = logged_in(7, MockOrderAuthority::new()).await;

    assert!(admin.can(&Action::Administer).is_allowed());
    assert!(admin.can(&Action::ViewAllOrders).is_allowed());
    assert!(staff.can(&Action::ViewAllOrders).is_allowed());
    assert_eq!(
        staff.can(&Action::Administer),
        Decision::Denied(DenyReason::Unauthorized)
    );
    assert_eq!(
        customer.can(&Action::ViewAllOrders),
        Decision::Denied(DenyReason::Unauthorized)
    );
    assert!(customer.can(&Action::EditCollection).is_allowed());
}
