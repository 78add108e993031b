//! Unifies API for managing the drinks on the menu.

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Drink, DrinkUpdate, NewDrink},
    traits::{DrinkApiError, DrinkManagement},
};

/// The `DrinksApi` provides a unified API for managing the menu.
pub struct DrinksApi<B> {
    db: B,
}

impl<B: Debug> Debug for DrinksApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DrinksApi ({:?})", self.db)
    }
}

impl<B> DrinksApi<B> {
    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> DrinksApi<B>
where B: DrinkManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches every drink on the menu. An empty menu is not an error at this level.
    pub async fn drinks(&self) -> Result<Vec<Drink>, DrinkApiError> {
        self.db.fetch_drinks().await
    }

    /// Fetches the drink with the given id. If no drink exists, `None` is returned.
    pub async fn drink_by_id(&self, id: i64) -> Result<Option<Drink>, DrinkApiError> {
        self.db.fetch_drink(id).await
    }

    /// Validates and stores a new drink.
    pub async fn create_drink(&self, drink: NewDrink) -> Result<Drink, DrinkApiError> {
        drink.validate()?;
        let drink = self.db.insert_drink(drink).await?;
        info!("☕️ '{}' was added to the menu as drink #{}", drink.title, drink.id);
        Ok(drink)
    }

    /// Validates and applies a partial update. Fields that are not set in `update` are left untouched.
    ///
    /// An empty update is not an error; the current drink is returned unchanged.
    pub async fn update_drink(&self, id: i64, update: DrinkUpdate) -> Result<Drink, DrinkApiError> {
        update.validate()?;
        let drink = if update.is_empty() {
            trace!("☕️ Empty update for drink #{id}");
            self.db.fetch_drink(id).await?
        } else {
            self.db.update_drink(id, update).await?
        };
        drink.ok_or(DrinkApiError::DrinkNotFound(id))
    }

    /// Removes the drink from the menu for good. Returns the id of the deleted drink.
    pub async fn delete_drink(&self, id: i64) -> Result<i64, DrinkApiError> {
        if self.db.delete_drink(id).await? {
            info!("☕️ Drink #{id} was removed from the menu");
            Ok(id)
        } else {
            Err(DrinkApiError::DrinkNotFound(id))
        }
    }
}
