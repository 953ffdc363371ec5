//! Grocer Storefront library.
//!
//! Cart, checkout, order history and the admin console, exposed as an axum
//! router. The binary wires it to `PostgreSQL`; tests wire it to the
//! in-memory stores in [`db`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
