//! Mary's Fashion Core - Shared domain types.
//!
//! This crate provides the types shared by every Mary's Fashion component:
//! - `storefront` - Public catalog API, search and autocomplete
//! - `cli` - Back-office tooling for products, categories, users and images
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Records are
//! persisted by the backend-as-a-service; these types describe the shape of
//! the rows the storefront reads and writes.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails and roles
//! - [`models`] - Products, categories, users and their write requests

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
