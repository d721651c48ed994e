//! Core types for Bistro.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod identity;
pub mod menu;
pub mod order;
pub mod price;
pub mod role;
pub mod status;

pub use credential::BearerToken;
pub use email::{Email, EmailError};
pub use id::*;
pub use identity::Identity;
pub use menu::MenuItem;
pub use order::{Order, OrderLine};
pub use price::{Price, PriceError};
pub use role::Role;
pub use status::*;
