//! Core types for Grocer.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod money;
pub mod payment;
pub mod phone;
pub mod product;
pub mod status;

pub use cart::{Cart, CartLine};
pub use id::*;
pub use money::{Money, MoneyError};
pub use payment::{CardDetails, PaymentDetailsError, PaymentMethod, PaymentSelection};
pub use phone::{Phone, PhoneError};
pub use product::{Category, Product};
pub use status::*;
