use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Drink, DrinkRow, DrinkUpdate, NewDrink},
    traits::DrinkApiError,
};

/// Returns every drink on the menu, ordered by id.
pub async fn fetch_drinks(conn: &mut SqliteConnection) -> Result<Vec<Drink>, DrinkApiError> {
    let rows: Vec<DrinkRow> = sqlx::query_as("SELECT id, title, recipe FROM drinks ORDER BY id").fetch_all(conn).await?;
    trace!("🗃️ Fetched {} drinks", rows.len());
    rows.into_iter().map(Drink::try_from).collect()
}

pub async fn fetch_drink(id: i64, conn: &mut SqliteConnection) -> Result<Option<Drink>, DrinkApiError> {
    let row: Option<DrinkRow> =
        sqlx::query_as("SELECT id, title, recipe FROM drinks WHERE id = $1").bind(id).fetch_optional(conn).await?;
    row.map(Drink::try_from).transpose()
}

/// Inserts a new drink and returns the stored record. The recipe is written as JSON text.
pub async fn insert_drink(drink: NewDrink, conn: &mut SqliteConnection) -> Result<Drink, DrinkApiError> {
    let recipe = drink.recipe.to_json()?;
    let row: DrinkRow = sqlx::query_as(
        r#"
            INSERT INTO drinks (title, recipe) VALUES ($1, $2)
            RETURNING id, title, recipe;
        "#,
    )
    .bind(&drink.title)
    .bind(recipe)
    .fetch_one(conn)
    .await
    .map_err(|e| map_unique_violation(e, &drink.title))?;
    debug!("🗃️ Drink '{}' inserted with id {}", row.title, row.id);
    Drink::try_from(row)
}

/// Overwrites the columns for the fields that are set in `update`, in a single statement.
/// Returns `None` if there is no drink with the given id.
pub async fn update_drink(
    id: i64,
    update: DrinkUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Drink>, DrinkApiError> {
    let recipe = update.recipe.as_ref().map(|r| r.to_json()).transpose()?;
    let title = update.title.clone().unwrap_or_default();
    let row: Option<DrinkRow> = sqlx::query_as(
        r#"
            UPDATE drinks SET
                title = COALESCE($1, title),
                recipe = COALESCE($2, recipe)
            WHERE id = $3
            RETURNING id, title, recipe;
        "#,
    )
    .bind(update.title)
    .bind(recipe)
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(|e| map_unique_violation(e, &title))?;
    if let Some(row) = &row {
        debug!("🗃️ Drink #{} updated", row.id);
    }
    row.map(Drink::try_from).transpose()
}

/// Deletes the drink. Returns `true` if a row was removed.
pub async fn delete_drink(id: i64, conn: &mut SqliteConnection) -> Result<bool, DrinkApiError> {
    let result = sqlx::query("DELETE FROM drinks WHERE id = $1").bind(id).execute(conn).await?;
    let deleted = result.rows_affected() > 0;
    if deleted {
        debug!("🗃️ Drink #{id} deleted");
    }
    Ok(deleted)
}

/// Removes every drink. The id sequence is left alone, so ids are still never re-used.
pub async fn delete_all_drinks(conn: &mut SqliteConnection) -> Result<u64, DrinkApiError> {
    let result = sqlx::query("DELETE FROM drinks").execute(conn).await?;
    Ok(result.rows_affected())
}

fn map_unique_violation(e: sqlx::Error, title: &str) -> DrinkApiError {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DrinkApiError::DuplicateTitle(title.into()),
        e => e.into(),
    }
}
