//! Wire types for the REST backend.

use serde::{Deserialize, Serialize};

use bistro_core::{Identity, OrderStatus, Role};

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

/// Body of a successful login or registration.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: Identity,
}

#[derive(Debug, Serialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// Error body. Backends disagree on the field name.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message in `raw`, falling back to the raw text.
    pub fn message_from(raw: &str) -> String {
        let body: Self = serde_json::from_str(raw).unwrap_or_default();
        body.message
            .or(body.error)
            .unwrap_or_else(|| raw.trim().chars().take(200).collect())
    }
}
