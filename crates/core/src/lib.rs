//! Bistro Core - Shared domain types.
//!
//! This crate provides the types used across all Bistro components:
//! - `client` - Session, cart, favorites and order state engine
//! - `cli` - Command-line front end driving the client against the backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no storage, no
//! HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, prices, roles, identities, menu items, orders
//!   and the order status lifecycle

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
