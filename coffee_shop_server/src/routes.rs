//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Database calls and key-set fetches are async, so keep them that way.
//!
//! Protected routes carry a `requires "<permission>"` clause. The permission is checked by
//! [`PermissionGuardFactory`](crate::middleware::PermissionGuardFactory) before the request body is read or the handler
//! is called.
use actix_web::{get, web, HttpResponse, Responder};
use futures::StreamExt;
use coffee_shop_engine::{
    db_types::{Drink, DrinkUpdate, NewDrink, ShortDrink},
    DrinkManagement,
    DrinksApi,
};
use log::*;
use serde::de::DeserializeOwned;

use crate::{
    auth::AuthorizedUser,
    data_objects::{DeleteResponse, DrinksResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $bound:path) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $bound + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $bound:path where requires $permission:literal) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $bound + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::PermissionGuardFactory::new($permission));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// The largest request body the drink routes will read
pub const MAX_PAYLOAD_SIZE: usize = 256 * 1024;

/// Every path served by the drink routes. Used to answer preflight requests and unsupported methods.
pub const DRINK_PATHS: [&str; 3] = ["/drinks", "/drinks-detail", "/drinks/{id}"];

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Drinks  ----------------------------------------------------
route!(drinks => Get "/drinks" impl DrinkManagement);
/// Route handler for the public menu
///
/// Returns every drink in its short form: ingredient colours and proportions, but no ingredient names.
/// An empty menu is reported as 404.
pub async fn drinks<B: DrinkManagement>(api: web::Data<DrinksApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET drinks");
    let drinks = fetch_menu(api.as_ref()).await?;
    let drinks = drinks.iter().map(|d| d.short()).collect::<Vec<ShortDrink>>();
    Ok(HttpResponse::Ok().json(DrinksResponse::new(drinks)))
}

route!(drinks_detail => Get "/drinks-detail" impl DrinkManagement where requires "get:drinks-detail");
/// Route handler for the full menu, including ingredient names. Requires `get:drinks-detail`.
pub async fn drinks_detail<B: DrinkManagement>(
    user: AuthorizedUser,
    api: web::Data<DrinksApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET drinks-detail for {}", user.subject);
    let drinks = fetch_menu(api.as_ref()).await?;
    let drinks = drinks.iter().map(|d| d.long()).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(DrinksResponse::new(drinks)))
}

async fn fetch_menu<B: DrinkManagement>(api: &DrinksApi<B>) -> Result<Vec<Drink>, ServerError> {
    let drinks = api.drinks().await.map_err(|e| {
        debug!("💻️ Could not fetch the menu. {e}");
        ServerError::from(e)
    })?;
    if drinks.is_empty() {
        debug!("💻️ The menu is empty");
        return Err(ServerError::NoRecordFound("There are no drinks on the menu".into()));
    }
    Ok(drinks)
}

route!(create_drink => Post "/drinks" impl DrinkManagement where requires "post:drinks");
/// Route handler for adding a drink to the menu. Requires `post:drinks`.
///
/// The body must contain a `title` and a `recipe`. The created drink is returned in its long form, as the only element
/// of `drinks`.
pub async fn create_drink<B: DrinkManagement>(
    user: AuthorizedUser,
    body: web::Payload,
    api: web::Data<DrinksApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ POST drinks from {}", user.subject);
    let drink = parse_payload::<NewDrink>(body).await?;
    let drink = api.create_drink(drink).await.map_err(|e| {
        debug!("💻️ Could not create drink. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(DrinksResponse::new(vec![drink.long()])))
}

route!(update_drink => Patch "/drinks/{id}" impl DrinkManagement where requires "patch:drinks");
/// Route handler for editing a drink. Requires `patch:drinks`.
///
/// Only the fields present in the body are changed. A drink that does not exist is reported as 404 before the body is
/// even looked at.
pub async fn update_drink<B: DrinkManagement>(
    user: AuthorizedUser,
    path: web::Path<i64>,
    body: web::Payload,
    api: web::Data<DrinksApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ PATCH drink #{id} from {}", user.subject);
    if api.drink_by_id(id).await?.is_none() {
        debug!("💻️ Drink #{id} does not exist");
        return Err(ServerError::NoRecordFound(format!("Drink {id} does not exist")));
    }
    let update = parse_payload::<DrinkUpdate>(body).await?;
    let drink = api.update_drink(id, update).await.map_err(|e| {
        debug!("💻️ Could not update drink #{id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(DrinksResponse::new(vec![drink.long()])))
}

route!(delete_drink => Delete "/drinks/{id}" impl DrinkManagement where requires "delete:drinks");
/// Route handler for removing a drink from the menu for good. Requires `delete:drinks`.
pub async fn delete_drink<B: DrinkManagement>(
    user: AuthorizedUser,
    path: web::Path<i64>,
    api: web::Data<DrinksApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ DELETE drink #{id} from {}", user.subject);
    let id = api.delete_drink(id).await.map_err(|e| {
        debug!("💻️ Could not delete drink #{id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(DeleteResponse::new(id)))
}

//----------------------------------------------   Fallbacks  ----------------------------------------------------
/// Answers CORS preflight requests. The CORS headers themselves are added to every response by the server.
pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// A known path was requested with a method it does not support
pub async fn method_not_allowed() -> Result<HttpResponse, ServerError> {
    Err(ServerError::MethodNotAllowed)
}

/// Nothing is served at the requested path
pub async fn not_found() -> Result<HttpResponse, ServerError> {
    Err(ServerError::NoRecordFound("resource not found".into()))
}

async fn parse_payload<T: DeserializeOwned>(mut payload: web::Payload) -> Result<T, ServerError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| {
            debug!("💻️ Could not read request body. {e}");
            ServerError::Unprocessable(format!("Could not read request body. {e}"))
        })?;
        if body.len() + chunk.len() > MAX_PAYLOAD_SIZE {
            debug!("💻️ Request body is larger than {MAX_PAYLOAD_SIZE} bytes");
            return Err(ServerError::PayloadTooLarge(MAX_PAYLOAD_SIZE));
        }
        body.extend_from_slice(&chunk);
    }
    serde_json::from_slice(&body).map_err(|e| {
        debug!("💻️ Could not read request body. {e}");
        ServerError::Unprocessable(format!("Invalid request body. {e}"))
    })
}
