//! Mary's Fashion Storefront library.
//!
//! Catalog search and autocomplete, back-office services and the HTTP API,
//! all over a remote backend reached through the [`gateway`] ports. The
//! binary and the CLI both build on this library.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod gateway;
pub mod routes;
pub mod search;
pub mod services;
pub mod state;
