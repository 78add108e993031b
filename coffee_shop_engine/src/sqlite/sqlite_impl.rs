//! `SqliteDatabase` is a concrete implementation of a coffee shop engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{drinks, new_pool};
use crate::{
    db_types::{Drink, DrinkUpdate, Ingredient, NewDrink},
    traits::{DrinkApiError, DrinkManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl DrinkManagement for SqliteDatabase {
    async fn fetch_drinks(&self) -> Result<Vec<Drink>, DrinkApiError> {
        let mut conn = self.pool.acquire().await?;
        drinks::fetch_drinks(&mut conn).await
    }

    async fn fetch_drink(&self, id: i64) -> Result<Option<Drink>, DrinkApiError> {
        let mut conn = self.pool.acquire().await?;
        drinks::fetch_drink(id, &mut conn).await
    }

    async fn insert_drink(&self, drink: NewDrink) -> Result<Drink, DrinkApiError> {
        let mut conn = self.pool.acquire().await?;
        drinks::insert_drink(drink, &mut conn).await
    }

    async fn update_drink(&self, id: i64, update: DrinkUpdate) -> Result<Option<Drink>, DrinkApiError> {
        let mut conn = self.pool.acquire().await?;
        drinks::update_drink(id, update, &mut conn).await
    }

    async fn delete_drink(&self, id: i64) -> Result<bool, DrinkApiError> {
        let mut conn = self.pool.acquire().await?;
        drinks::delete_drink(id, &mut conn).await
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), DrinkApiError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Empties the menu and seeds it with a single glass of water.
    ///
    /// **This deletes every drink.** It is intended for first-time set-up and for demos.
    pub async fn reset(&self) -> Result<Drink, DrinkApiError> {
        let mut tx = self.pool.begin().await?;
        let removed = drinks::delete_all_drinks(&mut tx).await?;
        warn!("🗃️ Menu reset. {removed} drinks were deleted");
        let water = NewDrink::new("water", vec![Ingredient::new("water", "blue", 1)]);
        let water = drinks::insert_drink(water, &mut tx).await?;
        tx.commit().await?;
        Ok(water)
    }

    pub async fn close(&mut self) -> Result<(), DrinkApiError> {
        self.pool.close().await;
        Ok(())
    }
}
