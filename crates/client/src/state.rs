//! Client state.
//!
//! One session, one cart, one favorites list and one order desk, wired
//! together so that the collections always belong to the identity the
//! session holds. The session commits first; the collections are re-scoped
//! after the session call has returned.
//!
//! Identity changes are only reachable through this type. The mutable
//! collection accessors also check the session channel and re-scope if the
//! session moved since the last load, so no write lands under an identity
//! the session no longer holds.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;

use bistro_core::{Identity, Order, OrderStatus, Role};

use crate::api::ApiClient;
use crate::authority::{IdentityAuthority, OrderAuthority};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::models::SessionState;
use crate::services::gate::{self, Action, Decision};
use crate::services::{CartStore, FavoritesStore, OrderDesk, OrderError, SessionError, SessionStore};
use crate::storage::{FileStore, SharedStore};

/// Everything a front end needs for one device.
pub struct ClientState<A, O> {
    session: SessionStore<A>,
    cart: CartStore,
    favorites: FavoritesStore,
    orders: OrderDesk<O>,
    observed: watch::Receiver<SessionState>,
}

impl ClientState<ApiClient, ApiClient> {
    /// State backed by the REST backend and a file store in the data
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the data directory cannot be created or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let storage: SharedStore = Arc::new(FileStore::in_dir(&config.data_dir)?);
        let api = ApiClient::new(config)?;
        Ok(Self::new(storage, api.clone(), api))
    }
}

impl<A: IdentityAuthority, O: OrderAuthority> ClientState<A, O> {
    /// Create state in the `Initializing` session state with empty
    /// collections. Call [`start`](Self::start) next.
    #[must_use]
    pub fn new(storage: SharedStore, identity: A, orders: O) -> Self {
        let session = SessionStore::new(storage.clone(), identity);
        let observed = session.subscribe();
        Self {
            session,
            cart: CartStore::new(storage.clone()),
            favorites: FavoritesStore::new(storage),
            orders: OrderDesk::new(orders),
            observed,
        }
    }

    /// Resolve the stored session, then load the collections for whoever
    /// turned out to be logged in.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if another session call is in flight.
    pub async fn start(&mut self) -> Result<Option<Identity>, SessionError> {
        let resolved = self.session.initialize().await;
        self.rescope();
        resolved
    }

    /// Log in and switch the collections to the new identity.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the login fails; the previous identity stays.
    pub async fn login(&mut self, email: &str, secret: &SecretString) -> Result<Identity, SessionError> {
        let identity = self.session.login(email, secret).await?;
        self.rescope();
        Ok(identity)
    }

    /// Register, log in and switch the collections to the new identity.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if registration fails.
    pub async fn register(
        &mut self,
        display_name: &str,
        email: &str,
        secret: &SecretString,
        role: Role,
    ) -> Result<Identity, SessionError> {
        let identity = self.session.register(display_name, email, secret, role).await?;
        self.rescope();
        Ok(identity)
    }

    /// Log out and empty the in-memory collections.
    ///
    /// Stored carts and favorites stay on the device for the next login.
    pub fn logout(&mut self) {
        self.session.logout();
        self.rescope();
    }

    /// Ask the authorization gate about the current identity.
    #[must_use]
    pub fn can(&self, action: &Action<'_>) -> Decision {
        gate::authorize(self.session.current().as_ref(), action)
    }

    /// Orders visible to the current identity.
    ///
    /// # Errors
    ///
    /// Returns `OrderError` from [`OrderDesk::fetch_orders`].
    pub async fn fetch_orders(&self) -> Result<Vec<Order>, OrderError> {
        let credential = self.session.credential();
        self.orders.fetch_orders(credential.as_ref()).await
    }

    /// Move an order to `to` as the current identity.
    ///
    /// # Errors
    ///
    /// Returns `OrderError` from [`OrderDesk::transition`].
    pub async fn transition_order(&self, order: &Order, to: OrderStatus) -> Result<Order, OrderError> {
        let credential = self.session.credential();
        self.orders.transition(credential.as_ref(), order, to).await
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore<A> {
        &self.session
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// The cart, re-scoped first if the session moved since the last load.
    pub fn cart_mut(&mut self) -> &mut CartStore {
        self.follow_session();
        &mut self.cart
    }

    #[must_use]
    pub const fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    /// Favorites, re-scoped first if the session moved since the last load.
    pub fn favorites_mut(&mut self) -> &mut FavoritesStore {
        self.follow_session();
        &mut self.favorites
    }

    #[must_use]
    pub const fn orders(&self) -> &OrderDesk<O> {
        &self.orders
    }

    fn rescope(&mut self) {
        let identity = self.observed.borrow_and_update().identity().cloned();
        self.cart.load(identity.as_ref());
        self.favorites.load(identity.as_ref());
    }

    fn follow_session(&mut self) {
        // The sender lives in `self.session`, so the channel cannot close.
        if self.observed.has_changed().unwrap_or(false) {
            tracing::debug!("Session moved without a re-scope, reloading collections");
            self.rescope();
        }
    }
}
