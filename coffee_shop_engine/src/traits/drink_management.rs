use thiserror::Error;

use crate::db_types::{Drink, DrinkUpdate, NewDrink};

#[derive(Debug, Clone, Error)]
pub enum DrinkApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A drink called '{0}' is already on the menu")]
    DuplicateTitle(String),
    #[error("Drink {0} does not exist")]
    DrinkNotFound(i64),
    #[error("Invalid drink. {0}")]
    ValidationError(String),
    #[error("The recipe stored for drink {id} is corrupt. {reason}")]
    CorruptRecipe { id: i64, reason: String },
}

impl From<sqlx::Error> for DrinkApiError {
    fn from(e: sqlx::Error) -> Self {
        DrinkApiError::DatabaseError(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for DrinkApiError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        DrinkApiError::DatabaseError(format!("Migration failed. {e}"))
    }
}

/// The `DrinkManagement` trait defines the storage operations for the drinks on the menu.
///
/// Every mutating call is committed before it returns. Implementations must never re-use the `id` of a deleted drink.
#[allow(async_fn_in_trait)]
pub trait DrinkManagement {
    /// Fetches every drink, ordered by id.
    async fn fetch_drinks(&self) -> Result<Vec<Drink>, DrinkApiError>;

    /// Fetches the drink with the given id. If no such drink exists, `None` is returned.
    async fn fetch_drink(&self, id: i64) -> Result<Option<Drink>, DrinkApiError>;

    /// Stores a new drink and returns it with its newly assigned id.
    ///
    /// Titles are unique. Inserting a drink whose title is already taken returns [`DrinkApiError::DuplicateTitle`].
    async fn insert_drink(&self, drink: NewDrink) -> Result<Drink, DrinkApiError>;

    /// Overwrites the fields that are set in `update`. Returns `None` if the drink does not exist.
    async fn update_drink(&self, id: i64, update: DrinkUpdate) -> Result<Option<Drink>, DrinkApiError>;

    /// Removes the drink permanently. Returns `false` if the drink did not exist.
    async fn delete_drink(&self, id: i64) -> Result<bool, DrinkApiError>;
}
