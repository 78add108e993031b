use coffee_shop_engine::{DrinksApi, SqliteDatabase};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/coffee_shop_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    info!("🚀️ Test database ready at {url}");
    db
}

pub async fn setup() -> DrinksApi<SqliteDatabase> {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    DrinksApi::new(db)
}

pub async fn tear_down(api: DrinksApi<SqliteDatabase>) {
    let mut db = api.db().clone();
    let url = db.url().to_string();
    drop(api);
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}
