//! Access gate middleware.
//!
//! Wraps resources that require roles. The session username is resolved
//! against the stores on every request; callers who may not pass are sent
//! to the login page with `303 See Other`, keeping the path they asked for.
//! Admitted requests carry their [`Identity`] in the request extensions for
//! the [`SignedIn`] extractor.

use std::future::{Ready, ready};
use std::rc::Rc;
use std::task::{Context, Poll};

use actix_session::SessionExt;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{AccessDecision, Error, Identity, LOGIN_PATH, RoleName, RoleSet};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Middleware factory admitting callers holding any of a set of roles.
///
/// # Examples
/// ```
/// use actix_web::{HttpResponse, web};
/// use storefront::inbound::http::access::RequireRoles;
///
/// let cart = web::resource("/cart")
///     .wrap(RequireRoles::user())
///     .route(web::get().to(HttpResponse::Ok));
/// ```
#[derive(Clone)]
pub struct RequireRoles {
    required: Rc<RoleSet>,
}

impl RequireRoles {
    /// Admit callers holding at least one of `roles`.
    pub fn any_of(roles: impl IntoIterator<Item = RoleName>) -> Self {
        Self {
            required: Rc::new(roles.into_iter().collect()),
        }
    }

    /// Shopper routes.
    pub fn user() -> Self {
        Self::any_of([RoleName::user()])
    }

    /// Account routes open to shoppers and administrators alike.
    pub fn user_or_admin() -> Self {
        Self::any_of([RoleName::user(), RoleName::admin()])
    }

    /// Catalogue and role management.
    pub fn admin() -> Self {
        Self::any_of([RoleName::admin()])
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRoles
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RequireRolesMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRolesMiddleware {
            service: Rc::new(service),
            required: Rc::clone(&self.required),
        }))
    }
}

/// Service wrapper produced by [`RequireRoles`].
pub struct RequireRolesMiddleware<S> {
    service: Rc<S>,
    required: Rc<RoleSet>,
}

fn requested_path(req: &ServiceRequest) -> String {
    req.uri()
        .path_and_query()
        .map_or_else(|| req.path().to_owned(), |pq| pq.as_str().to_owned())
}

impl<S, B> Service<ServiceRequest> for RequireRolesMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required = Rc::clone(&self.required);
        Box::pin(async move {
            let state = req
                .app_data::<web::Data<HttpState>>()
                .cloned()
                .ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let username = SessionContext::new(req.get_session()).username()?;
            let requested = requested_path(&req);
            let decision = state
                .bounded(
                    state
                        .access
                        .authorise(username.as_ref(), &required, &requested),
                )
                .await?;

            match decision {
                AccessDecision::Allow(identity) => {
                    if let Some(identity) = identity {
                        req.extensions_mut().insert(identity);
                    }
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                redirect @ AccessDecision::RedirectToLogin { .. } => {
                    let location = redirect
                        .login_location()
                        .unwrap_or_else(|| LOGIN_PATH.to_owned());
                    debug!(
                        path = %requested,
                        signed_in = username.is_some(),
                        required = %required.joined(),
                        "access denied; redirecting to login"
                    );
                    let response = HttpResponse::SeeOther()
                        .insert_header((header::LOCATION, location))
                        .finish();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// Extractor for the identity admitted by [`RequireRoles`].
///
/// Fails with `401 Unauthorized` on routes the gate does not wrap.
#[derive(Debug, Clone)]
pub struct SignedIn(pub Identity);

impl FromRequest for SignedIn {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .map(SignedIn)
                .ok_or_else(|| Error::unauthorized("login required")),
        )
    }
}

#[cfg(test)]
#[path = "access_tests.rs"]
mod tests;
