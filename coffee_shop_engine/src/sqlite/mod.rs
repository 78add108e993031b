//! SQLite backend for the coffee shop engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
