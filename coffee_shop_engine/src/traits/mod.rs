//! # Storage contracts
//!
//! This module defines the behaviour a database backend must expose in order to act as the drink store for the
//! coffee shop.
//!
//! * [`DrinkManagement`] provides create, read, update and delete access to the drinks on the menu.
//!
//! Backends never validate user input. Validation happens in [`crate::DrinksApi`] before any call reaches a backend.
mod drink_management;

pub use drink_management::{DrinkApiError, DrinkManagement};
