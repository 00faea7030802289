//! The Shop Core - Shared domain types.
//!
//! This crate provides the types shared by every The Shop component:
//! - `client` - API client and session state manager
//! - `cli` - Terminal front end (`shop`)
//! - `integration-tests` - Mock API and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no async runtime. This keeps it lightweight and trivially testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, ratings and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
