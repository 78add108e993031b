use std::time::Duration;

use actix_web::{
    dev::Server,
    guard,
    http::KeepAlive,
    middleware::{DefaultHeaders, Logger},
    web,
    web::ServiceConfig,
    App,
    HttpServer,
};
use coffee_shop_engine::{DrinkManagement, DrinksApi, SqliteDatabase};
use log::{info, warn};

use crate::{
    auth::TokenAuthority,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        method_not_allowed,
        not_found,
        preflight,
        CreateDrinkRoute,
        DeleteDrinkRoute,
        DrinksDetailRoute,
        DrinksRoute,
        UpdateDrinkRoute,
        DRINK_PATHS,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.reset_database {
        let seed = db.reset().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
        warn!("🚀️ The menu has been reset. It now contains {seed}");
    }
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(ServerError::from)
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    // Created once, so that every worker shares the same signing key cache
    let authority = web::Data::new(TokenAuthority::new(&config.auth));
    info!("🚀️ Access tokens are verified with {authority:?}");
    let srv = HttpServer::new(move || {
        let drinks_api = DrinksApi::new(db.clone());
        App::new()
            .wrap(cors_headers())
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %r").log_target("coffee_shop::access_log"))
            .app_data(web::Data::new(drinks_api))
            .app_data(authority.clone())
            .configure(configure_routes::<SqliteDatabase>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route, the fallbacks and the extractor configuration. The caller provides the `DrinksApi` and
/// `TokenAuthority` app data.
pub fn configure_routes<B: DrinkManagement + 'static>(cfg: &mut ServiceConfig) {
    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ServerError::NoRecordFound(format!("Invalid path. {err}")).into()),
    )
    .service(health)
    .service(DrinksRoute::<B>::new())
    .service(DrinksDetailRoute::<B>::new())
    .service(CreateDrinkRoute::<B>::new())
    .service(UpdateDrinkRoute::<B>::new())
    .service(DeleteDrinkRoute::<B>::new())
    // Reached only when none of the routes above accepted the method
    .service(
        web::resource(DRINK_PATHS)
            .name("drinks_fallback")
            .route(web::route().guard(guard::Options()).to(preflight))
            .default_service(web::to(method_not_allowed)),
    )
    .default_service(web::to(not_found));
}

/// Permissive CORS headers, added to every response that does not set them itself.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Headers", "Content-Type,Authorization"))
        .add(("Access-Control-Allow-Methods", "GET,POST,DELETE,PATCH,OPTIONS"))
}
