//! Grocer Core - Shared types library.
//!
//! This crate provides the domain types used across all Grocer components:
//! - `storefront` - Cart, checkout, order tracking and the admin console API
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. Cart arithmetic, payment validation and the order status
//! transition table live here so they can be tested without any runtime.
//!
//! # Modules
//!
//! - [`types`] - IDs, money, phone numbers, products, carts, payment and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
