//! Coffee Shop Engine
//!
//! This library contains the storage layer and the public API for the menu of a single coffee shop. The menu is a
//! collection of drinks, each with a title and a recipe made up of coloured ingredients.
//!
//! The library is divided into three sections:
//! 1. The data types ([`mod@db_types`]) shared by every layer, including the public ("short") and full ("long")
//!    representations of a drink.
//! 2. The backend contract ([`mod@traits`]) and its SQLite implementation, [`SqliteDatabase`]. You should never need
//!    to access the database directly.
//! 3. The public API ([`DrinksApi`]), which validates input and delegates to any backend implementing
//!    [`DrinkManagement`].
pub mod db_types;
mod menu_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use menu_api::drinks_api::DrinksApi;
pub use traits::{DrinkApiError, DrinkManagement};
