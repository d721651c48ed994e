//! Command implementations.
//!
//! Every command runs against a started [`ClientState`]; results go to
//! stdout, refusals to stderr as the client's user-facing message.

pub mod cart;
pub mod favorites;
pub mod orders;
pub mod session;

use bistro_client::{ClientError, ClientState};
use bistro_client::api::ApiClient;

/// Client state backed by the REST backend.
pub type App = ClientState<ApiClient, ApiClient>;

/// Print the user-facing message of `err`.
#[allow(clippy::print_stderr)]
pub fn print_error(err: &ClientError) {
    eprintln!("error: {}", err.user_message());
}
