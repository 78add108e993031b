//! # Coffee shop engine public API
//!
//! The `menu_api` module exposes the programmatic API for the coffee shop menu.
//!
//! * [`drinks_api`] provides create, read, update and delete access to the drinks on the menu, and validates
//!   everything before it reaches the backend.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits required by the API.
//!
//! ```rust,ignore
//! use coffee_shop_engine::{DrinksApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/coffee_shop.db", 5).await?;
//! // SqliteDatabase implements DrinkManagement
//! let api = DrinksApi::new(db);
//! let menu = api.drinks().await?;
//! ```

pub mod drinks_api;
