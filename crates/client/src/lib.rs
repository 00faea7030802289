//! The Shop client library.
//!
//! Talks to the Online Store REST API and keeps the state of one shopping
//! session: catalog, cart, wishlist, authentication and profile.
//!
//! # Modules
//!
//! - [`api`] - Typed REST client and wire types
//! - [`manager`] - [`SessionManager`], the only place state changes
//! - [`state`] - [`ShopState`] and its parts, read-only outside this crate
//! - [`token`] - Bearer token persistence
//! - [`config`] - Environment-based configuration
//! - [`error`] - Intent-level errors and Sentry helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod manager;
pub mod state;
pub mod token;

pub use api::{ApiClient, ApiError};
pub use config::{ClientConfig, ConfigError};
pub use error::{Action, ActionError, Severity};
pub use manager::{BootstrapReport, SessionManager};
pub use state::{AuthMode, ShopState, Tab};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
