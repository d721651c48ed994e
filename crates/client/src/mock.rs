//! In-memory authorities and fixtures.
//!
//! Available to this crate's unit tests and, through the `test-util`
//! feature, to the integration tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Notify;

use bistro_core::{
    BearerToken, Email, Identity, MenuItemId, Order, OrderId, OrderLine, OrderStatus, OrderType,
    Price, Role, UserId,
};

use crate::authority::{AuthGrant, AuthorityError, IdentityAuthority, NewAccount, OrderAuthority};

/// Identity with a predictable email (`user{id}@bistro.test`).
#[must_use]
pub fn identity(id: i64, role: Role) -> Identity {
    let email = Email::parse(&format!("user{id}@bistro.test"));
    Identity {
        id: UserId::new(id),
        display_name: format!("User {id}"),
        email: email.unwrap_or_else(|_| unreachable!("fixture email is well formed")),
        role,
        is_active: true,
    }
}

/// Single-line dine-in order placed by `customer`.
#[must_use]
pub fn order(id: i64, customer: i64, status: OrderStatus) -> Order {
    Order {
        id: OrderId::new(id),
        customer_id: UserId::new(customer),
        items: vec![OrderLine {
            menu_item_id: MenuItemId::new("m1"),
            quantity: 1,
            unit_price: Price::from_cents(1299),
        }],
        status,
        order_type: OrderType::DineIn,
        created_at: DateTime::<Utc>::from_timestamp(1_767_268_800, 0).unwrap_or_default(),
        estimated_time: None,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pauses requests until released, when armed.
#[derive(Debug, Default)]
struct Gate {
    hold: Mutex<Option<Arc<Notify>>>,
}

impl Gate {
    fn arm(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *lock(&self.hold) = Some(notify.clone());
        notify
    }

    async fn pass(&self) {
        let held = lock(&self.hold).clone();
        if let Some(notify) = held {
            notify.notified().await;
        }
    }
}

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password: String,
}

#[derive(Debug, Default)]
struct Directory {
    accounts: BTreeMap<UserId, Account>,
    tokens: BTreeMap<String, UserId>,
}

impl Directory {
    fn find_by_email(&self, email: &Email) -> Option<&Account> {
        self.accounts.values().find(|a| &a.identity.email == email)
    }
}

/// In-memory identity authority.
///
/// Issues tokens of the form `tok-{user_id}-{n}`. Registration never grants
/// staff or admin roles.
#[derive(Debug, Default)]
pub struct MockIdentityAuthority {
    directory: Mutex<Directory>,
    unavailable: AtomicBool,
    calls: AtomicUsize,
    issued: AtomicU64,
    gate: Gate,
}

impl MockIdentityAuthority {
    /// Authority with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account that can log in with `password`.
    #[must_use]
    pub fn with_account(self, identity: Identity, password: &str) -> Self {
        self.add_account(identity, password);
        self
    }

    /// Add or replace an account.
    pub fn add_account(&self, identity: Identity, password: &str) {
        lock(&self.directory).accounts.insert(
            identity.id,
            Account {
                identity,
                password: password.to_owned(),
            },
        );
    }

    /// Replace the stored identity of an existing account.
    pub fn update_identity(&self, identity: Identity) {
        if let Some(account) = lock(&self.directory).accounts.get_mut(&identity.id) {
            account.identity = identity;
        }
    }

    /// Make every request fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Invalidate every issued token.
    pub fn revoke_all(&self) {
        lock(&self.directory).tokens.clear();
    }

    /// Copy accounts and live tokens from another authority.
    ///
    /// Models a fresh process talking to the same backend.
    pub fn adopt_tokens_from(&self, other: &Self) {
        let (accounts, tokens) = {
            let source = lock(&other.directory);
            (source.accounts.clone(), source.tokens.clone())
        };
        let mut directory = lock(&self.directory);
        directory.accounts.extend(accounts);
        directory.tokens.extend(tokens);
    }

    /// Number of requests received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Hold every following request until the returned handle is notified.
    #[must_use]
    pub fn hold_requests(&self) -> Arc<Notify> {
        self.gate.arm()
    }

    async fn enter(&self) -> Result<(), AuthorityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthorityError::Unavailable("connection refused".to_owned()));
        }
        Ok(())
    }

    fn issue(&self, directory: &mut Directory, identity: Identity) -> AuthGrant {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("tok-{}-{n}", identity.id);
        directory.tokens.insert(token.clone(), identity.id);
        AuthGrant {
            token: BearerToken::new(token),
            identity,
        }
    }
}

impl IdentityAuthority for MockIdentityAuthority {
    async fn login(&self, email: &Email, secret: &SecretString) -> Result<AuthGrant, AuthorityError> {
        self.enter().await?;
        let mut directory = lock(&self.directory);
        let identity = directory
            .find_by_email(email)
            .filter(|account| account.password == secret.expose_secret())
            .map(|account| account.identity.clone())
            .ok_or(AuthorityError::Unauthenticated)?;
        Ok(self.issue(&mut directory, identity))
    }

    async fn register(&self, account: &NewAccount<'_>) -> Result<AuthGrant, AuthorityError> {
        self.enter().await?;
        let mut directory = lock(&self.directory);
        if directory.find_by_email(&account.email).is_some() {
            return Err(AuthorityError::Rejected {
                status: 409,
                message: "email already registered".to_owned(),
            });
        }

        let next_id = directory
            .accounts
            .keys()
            .map(UserId::as_i64)
            .max()
            .map_or(100, |max| max.max(99) + 1);
        let role = if account.role.is_staff() {
            Role::Customer
        } else {
            account.role
        };
        let identity = Identity {
            id: UserId::new(next_id),
            display_name: account.display_name.clone(),
            email: account.email.clone(),
            role,
            is_active: true,
        };
        directory.accounts.insert(
            identity.id,
            Account {
                identity: identity.clone(),
                password: account.secret.expose_secret().to_owned(),
            },
        );
        Ok(self.issue(&mut directory, identity))
    }

    async fn resolve(&self, token: &BearerToken) -> Result<Identity, AuthorityError> {
        self.enter().await?;
        let directory = lock(&self.directory);
        directory
            .tokens
            .get(token.expose())
            .and_then(|id| directory.accounts.get(id))
            .map(|account| account.identity.clone())
            .ok_or(AuthorityError::Unauthenticated)
    }
}

/// In-memory order authority.
///
/// Staff see every order, customers their own. Enforces the lifecycle but
/// not role rules, so tests can prove the client checks them first.
#[derive(Debug, Default)]
pub struct MockOrderAuthority {
    orders: Mutex<BTreeMap<OrderId, Order>>,
    transition_calls: AtomicUsize,
    leak_all: AtomicBool,
    unavailable: AtomicBool,
    answer_status: Mutex<Option<OrderStatus>>,
}

impl MockOrderAuthority {
    /// Authority with no orders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed orders.
    #[must_use]
    pub fn with_orders(self, orders: impl IntoIterator<Item = Order>) -> Self {
        lock(&self.orders).extend(orders.into_iter().map(|o| (o.id, o)));
        self
    }

    /// Current copy of an order.
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<Order> {
        lock(&self.orders).get(&id).cloned()
    }

    /// Number of transition requests received.
    #[must_use]
    pub fn transition_calls(&self) -> usize {
        self.transition_calls.load(Ordering::SeqCst)
    }

    /// Return every order to every viewer, like a misbehaving backend.
    pub fn leak_all_orders(&self, leak: bool) {
        self.leak_all.store(leak, Ordering::SeqCst);
    }

    /// Make every request fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Answer transitions with `status` instead of the requested one.
    pub fn answer_transitions_with(&self, status: Option<OrderStatus>) {
        *lock(&self.answer_status) = status;
    }

    fn check_available(&self) -> Result<(), AuthorityError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AuthorityError::Unavailable("connection refused".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl OrderAuthority for MockOrderAuthority {
    async fn fetch_orders(
        &self,
        _token: &BearerToken,
        viewer: &Identity,
    ) -> Result<Vec<Order>, AuthorityError> {
        self.check_available()?;
        let see_all = viewer.role.is_staff() || self.leak_all.load(Ordering::SeqCst);
        Ok(lock(&self.orders)
            .values()
            .filter(|order| see_all || order.is_owned_by(viewer.id))
            .cloned()
            .collect())
    }

    async fn transition(
        &self,
        _token: &BearerToken,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, AuthorityError> {
        self.transition_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let answer = *lock(&self.answer_status);
        let mut orders = lock(&self.orders);
        let order = orders.get_mut(&order_id).ok_or_else(|| AuthorityError::Rejected {
            status: 404,
            message: format!("order {order_id} not found"),
        })?;
        order
            .status
            .validate_transition(status)
            .map_err(|illegal| AuthorityError::Rejected {
                status: 409,
                message: illegal.to_string(),
            })?;

        order.status = answer.unwrap_or(status);
        Ok(order.clone())
    }
}
