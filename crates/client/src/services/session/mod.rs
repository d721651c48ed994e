//! Session store.
//!
//! Owns who is logged in on this device.
//!
//! # States
//!
//! ```text
//! Initializing --initialize()--> Authenticated | Anonymous
//! Anonymous    --login()/register()--> Authenticated
//! Authenticated --logout()--> Anonymous
//! ```
//!
//! # Persistence
//!
//! The bearer token and the identity it authenticates are stored under
//! `session.credential` and `session.identity`, always written and cleared
//! together. On start-up the stored token is re-resolved against the identity
//! authority before anything trusts it.
//!
//! # Serialization
//!
//! At most one network call (start-up resolution, login or registration) is
//! in flight per store; overlapping calls fail with [`SessionError::Busy`].
//! Every call takes a ticket from an epoch counter and `logout()` advances the
//! epoch, so a result that arrives after a logout is discarded with
//! [`SessionError::Superseded`] instead of resurrecting the session.

mod error;

pub use error::SessionError;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::instrument;

use bistro_core::{BearerToken, Email, Identity, Role};

use crate::authority::{AuthGrant, AuthorityError, IdentityAuthority, NewAccount};
use crate::models::keys;
use crate::models::{Credential, SessionState};
use crate::storage::{self, SharedStore};

/// Session store.
///
/// State lives in a `watch` channel: [`subscribe`](Self::subscribe) observes
/// every committed transition, after storage has been updated.
pub struct SessionStore<A> {
    storage: SharedStore,
    authority: A,
    state: watch::Sender<SessionState>,
    busy: AtomicBool,
    epoch: AtomicU64,
}

/// Clears the busy flag when the request finishes or its future is dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<A: IdentityAuthority> SessionStore<A> {
    /// Create a store in the `Initializing` state.
    ///
    /// Call [`initialize`](Self::initialize) before reading the identity.
    #[must_use]
    pub fn new(storage: SharedStore, authority: A) -> Self {
        let (state, _) = watch::channel(SessionState::Initializing);
        Self {
            storage,
            authority,
            state,
            busy: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Snapshot of the current identity. `None` means anonymous.
    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    /// Snapshot of the current credential.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.state.borrow().credential().cloned()
    }

    /// Whether a network call is in flight. UIs disable submit while busy.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Observe committed session transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The identity authority this store talks to.
    pub const fn authority(&self) -> &A {
        &self.authority
    }

    /// Resolve the stored credential, if any.
    ///
    /// Success leaves the store `Authenticated` with the authority's current
    /// copy of the identity. Any failure (revoked, expired, unreachable)
    /// clears the stored pair and leaves the store `Anonymous`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Busy` if another request is in flight, or
    /// `SessionError::Superseded` if the session was logged out meanwhile.
    #[instrument(skip(self))]
    pub(crate) async fn initialize(&self) -> Result<Option<Identity>, SessionError> {
        let _busy = self.begin()?;
        let ticket = self.next_ticket();

        let Some(stored) = self.load_stored() else {
            self.commit(SessionState::Anonymous);
            return Ok(None);
        };

        let resolved = self.authority.resolve(&stored.token).await;
        self.check_ticket(ticket)?;

        match resolved {
            Ok(identity) => {
                let credential = Credential {
                    token: stored.token,
                    identity,
                };
                self.persist(&credential);
                tracing::info!(user_id = %credential.identity.id, "Restored session");
                let identity = credential.identity.clone();
                self.commit(SessionState::Authenticated(credential));
                Ok(Some(identity))
            }
            Err(err) => {
                tracing::warn!(
                    user_id = %stored.identity.id,
                    error = %err,
                    "Stored session could not be resolved, clearing it"
                );
                self.clear_persisted();
                self.commit(SessionState::Anonymous);
                Ok(None)
            }
        }
    }

    /// Log in with email and password.
    ///
    /// A malformed email fails locally with `InvalidCredentials`. On failure
    /// the session is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials`, `NetworkUnavailable`, `ServerRejected`,
    /// `Busy` or `Superseded`.
    #[instrument(skip(self, secret))]
    pub(crate) async fn login(&self, email: &str, secret: &SecretString) -> Result<Identity, SessionError> {
        let _busy = self.begin()?;
        let email = Email::parse(email).map_err(|_| SessionError::InvalidCredentials)?;
        let ticket = self.next_ticket();

        let grant = self.authority.login(&email, secret).await;
        self.accept_grant(ticket, grant)
    }

    /// Register a new account and log it in.
    ///
    /// `role` is a request; the identity returned by the authority is what
    /// gets stored.
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login).
    #[instrument(skip(self, secret))]
    pub(crate) async fn register(
        &self,
        display_name: &str,
        email: &str,
        secret: &SecretString,
        role: Role,
    ) -> Result<Identity, SessionError> {
        let _busy = self.begin()?;
        let email = Email::parse(email).map_err(|_| SessionError::InvalidCredentials)?;
        let ticket = self.next_ticket();

        let account = NewAccount {
            display_name: display_name.trim().to_owned(),
            email,
            secret,
            role,
        };
        let grant = self.authority.register(&account).await;
        self.accept_grant(ticket, grant)
    }

    /// Log out.
    ///
    /// Clears the stored pair and the in-memory identity before returning, and
    /// invalidates any request still in flight.
    pub(crate) fn logout(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let previous = self.current();
        self.clear_persisted();
        self.commit(SessionState::Anonymous);

        if let Some(identity) = previous {
            tracing::info!(user_id = %identity.id, "Logged out");
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn begin(&self) -> Result<BusyGuard<'_>, SessionError> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SessionError::Busy)?;
        Ok(BusyGuard(&self.busy))
    }

    fn next_ticket(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn check_ticket(&self, ticket: u64) -> Result<(), SessionError> {
        if self.epoch.load(Ordering::SeqCst) == ticket {
            Ok(())
        } else {
            tracing::debug!(ticket, "Discarding superseded session result");
            Err(SessionError::Superseded)
        }
    }

    fn accept_grant(
        &self,
        ticket: u64,
        grant: Result<AuthGrant, AuthorityError>,
    ) -> Result<Identity, SessionError> {
        self.check_ticket(ticket)?;
        let grant = grant?;

        let credential = Credential {
            token: grant.token,
            identity: grant.identity,
        };
        self.persist(&credential);
        tracing::info!(
            user_id = %credential.identity.id,
            role = %credential.identity.role,
            "Logged in"
        );

        let identity = credential.identity.clone();
        self.commit(SessionState::Authenticated(credential));
        Ok(identity)
    }

    fn commit(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Read the stored pair. A half-written or unreadable pair is cleared.
    fn load_stored(&self) -> Option<Credential> {
        let token = self.storage.get(keys::SESSION_CREDENTIAL).map(BearerToken::from);
        let identity = storage::try_read_json::<Identity>(&*self.storage, keys::SESSION_IDENTITY);

        match (token, identity) {
            (None, Ok(None)) => None,
            (Some(token), Ok(Some(identity))) if !token.is_blank() => {
                Some(Credential { token, identity })
            }
            (token, identity) => {
                tracing::warn!(
                    has_token = token.is_some(),
                    identity_error = ?identity.as_ref().err(),
                    "Incomplete stored session, clearing it"
                );
                self.clear_persisted();
                None
            }
        }
    }

    /// Write the pair. On failure nothing is left half-written.
    fn persist(&self, credential: &Credential) {
        let written = storage::write_json(&*self.storage, keys::SESSION_IDENTITY, &credential.identity)
            .and_then(|()| {
                self.storage
                    .set(keys::SESSION_CREDENTIAL, credential.token.expose())
            });

        if let Err(err) = written {
            tracing::warn!(error = %err, "Could not persist session, it will not survive a restart");
            self.clear_persisted();
        }
    }

    fn clear_persisted(&self) {
        storage::discard(&*self.storage, keys::SESSION_CREDENTIAL);
        storage::discard(&*self.storage, keys::SESSION_IDENTITY);
    }
}
