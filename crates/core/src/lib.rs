//! IDWM Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront and its tests:
//! validated emails, user roles, product prices and product IDs.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! handling. The storefront crate owns everything that talks to the backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
