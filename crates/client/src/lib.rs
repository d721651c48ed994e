//! Bistro client state engine.
//!
//! Keeps the per-device state of the ordering front end: who is logged in,
//! their cart and favorites, and role-gated access to orders. The backend is
//! reached through the [`authority`] traits; [`api::ApiClient`] implements
//! them over HTTP.
//!
//! # Modules
//!
//! - [`storage`] - Durable key/value storage (file and memory)
//! - [`services`] - Session store, scoped collections, authorization gate,
//!   order desk
//! - [`state`] - `ClientState`, which keeps the collections in step with the
//!   session

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod authority;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;

pub use config::ClientConfig;
pub use error::ClientError;
pub use state::ClientState;
