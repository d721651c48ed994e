//! Session commands.

use secrecy::SecretString;

use bistro_client::ClientError;
use bistro_core::{Identity, Role};

use super::App;
use crate::telemetry;

/// Log in and report who is now logged in.
///
/// # Errors
///
/// Returns the session error if the login is refused or fails.
pub async fn login(app: &mut App, email: &str, secret: &SecretString) -> Result<(), ClientError> {
    let identity = app.login(email, secret).await?;
    telemetry::set_sentry_user(&identity);
    print_identity("Logged in as", &identity);
    Ok(())
}

/// Register, log in and report the identity the server granted.
///
/// # Errors
///
/// Returns the session error if the registration is refused or fails.
pub async fn register(
    app: &mut App,
    name: &str,
    email: &str,
    secret: &SecretString,
    role: Role,
) -> Result<(), ClientError> {
    let identity = app.register(name, email, secret, role).await?;
    if identity.role != role {
        tracing::info!(requested = %role, granted = %identity.role, "Server assigned a different role");
    }
    telemetry::set_sentry_user(&identity);
    print_identity("Registered", &identity);
    Ok(())
}

pub fn logout(app: &mut App) {
    app.logout();
    telemetry::clear_sentry_user();
    print_line("Logged out");
}

pub fn whoami(app: &App) {
    match app.session().current() {
        Some(identity) => print_identity("Logged in as", &identity),
        None => print_line("Not logged in"),
    }
}

#[allow(clippy::print_stdout)]
fn print_identity(label: &str, identity: &Identity) {
    println!(
        "{label} {} <{}> (id {}, {})",
        identity.display_name, identity.email, identity.id, identity.role
    );
}

#[allow(clippy::print_stdout)]
fn print_line(line: &str) {
    println!("{line}");
}
