//! Client services.

pub mod collection;
pub mod gate;
pub mod orders;
pub mod session;

pub use collection::{AddOutcome, CartStore, CollectionError, FavoritesStore};
pub use gate::{Action, Decision, DenyReason, authorize};
pub use orders::{OrderDesk, OrderError};
pub use session::{SessionError, SessionStore};
