//! Permission guard middleware for the coffee shop server.
//! This middleware can be placed on any route or service.
//!
//! It reads the bearer token from the `Authorization` header, verifies it with the shared [`TokenAuthority`] and checks
//! that the token grants the permission required by the route. If it does, the verified [`AuthorizedUser`] is stored
//! in the request extensions and the request continues. Otherwise the request is answered with the error envelope and
//! the handler never runs.

use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web,
    Error,
    HttpMessage,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::{debug, error};

use crate::{
    auth::{AuthorizedUser, TokenAuthority},
    errors::ServerError,
};

pub struct PermissionGuardFactory {
    required_permission: String,
}

impl PermissionGuardFactory {
    pub fn new(required_permission: &str) -> Self {
        PermissionGuardFactory { required_permission: required_permission.to_string() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PermissionGuardFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = PermissionGuardService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(PermissionGuardService {
            required_permission: Rc::new(self.required_permission.clone()),
            service: Rc::new(service),
        })
    }
}

pub struct PermissionGuardService<S> {
    required_permission: Rc<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for PermissionGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_permission = Rc::clone(&self.required_permission);
        Box::pin(async move {
            let Some(authority) = req.app_data::<web::Data<TokenAuthority>>().cloned() else {
                error!("🔐️ No token authority has been configured. Denying access to {}", req.path());
                let err = ServerError::Unspecified("Authorization is not configured".to_string());
                return Ok(req.error_response(err).map_into_right_body());
            };
            let header = req.headers().get(AUTHORIZATION).map(|v| v.to_str().unwrap_or_default().to_string());
            match authority.authorize(header.as_deref(), &required_permission).await {
                Ok(user) => {
                    req.extensions_mut().insert::<AuthorizedUser>(user);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                },
                Err(e) => {
                    debug!("🔐️ {} {} denied. {e}", req.method(), req.path());
                    Ok(req.error_response(ServerError::from(e)).map_into_right_body())
                },
            }
        })
    }
}
