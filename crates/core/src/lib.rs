//! RocketShoes Core - Shared types library.
//!
//! This crate provides the types shared by the cart components:
//! - `cart` - Cart store, remote clients and persistence
//! - `cli` - Terminal front-end for the cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, products, cart entries and stock snapshots

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
