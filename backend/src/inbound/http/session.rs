//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The identity cookie carries only the signed-in username. Roles and
//! balances are always read from the stores, so a cookie never grants more
//! than the account currently holds.

use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionMiddleware};
use actix_web::cookie::{Key, SameSite, time::Duration as CookieDuration};
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, Username};
use crate::inbound::http::session_config::SessionSettings;

pub(crate) const USERNAME_KEY: &str = "username";

/// Name of the identity cookie.
pub const SESSION_COOKIE_NAME: &str = "session";

/// How the identity cookie is issued: encrypted and signed with `key`,
/// `HttpOnly`, scoped to the whole site and expiring after `ttl_hours`.
///
/// ```
/// use actix_web::cookie::{Key, SameSite};
/// use storefront::inbound::http::session::SessionCookiePolicy;
///
/// let policy = SessionCookiePolicy::new(Key::generate(), 2)
///     .with_secure(false)
///     .with_same_site(SameSite::Lax);
/// let _middleware = policy.middleware();
/// ```
#[derive(Clone)]
pub struct SessionCookiePolicy {
    key: Key,
    secure: bool,
    same_site: SameSite,
    ttl_hours: u32,
}

impl SessionCookiePolicy {
    /// Secure, `SameSite=Strict` cookies signed with `key`.
    pub fn new(key: Key, ttl_hours: u32) -> Self {
        Self {
            key,
            secure: true,
            same_site: SameSite::Strict,
            ttl_hours,
        }
    }

    /// Whether the cookie carries the `Secure` attribute.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// `SameSite` attribute for the cookie.
    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Cookie lifetime in hours.
    pub fn ttl_hours(&self) -> u32 {
        self.ttl_hours
    }

    /// Session middleware storing the whole session in a private cookie.
    pub fn middleware(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE_NAME.to_owned())
            .cookie_path("/".to_owned())
            .cookie_secure(self.secure)
            .cookie_http_only(true)
            .cookie_content_security(CookieContentSecurity::Private)
            .cookie_same_site(self.same_site)
            .session_lifecycle(
                PersistentSession::default()
                    .session_ttl(CookieDuration::hours(i64::from(self.ttl_hours))),
            )
            .build()
    }
}

impl From<SessionSettings> for SessionCookiePolicy {
    fn from(settings: SessionSettings) -> Self {
        Self::new(settings.key, settings.ttl_hours)
            .with_secure(settings.cookie_secure)
            .with_same_site(settings.same_site)
    }
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated username in the session cookie.
    ///
    /// The session id is renewed so a cookie issued before login cannot be
    /// replayed as the signed-in one.
    pub fn persist_user(&self, username: &Username) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USERNAME_KEY, username.as_str())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the signed-in username, if any.
    pub fn username(&self) -> Result<Option<Username>, Error> {
        let raw = self
            .0
            .get::<String>(USERNAME_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|value| match Username::new(&value) {
            Ok(username) => Some(username),
            Err(error) => {
                warn!(%error, "invalid username in session cookie");
                None
            }
        }))
    }

    /// Require a signed-in username or return `401 Unauthorized`.
    pub fn require_username(&self) -> Result<Username, Error> {
        self.username()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Forget the signed-in user.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_session::Session;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    fn session_test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().wrap(crate::inbound::http::test_utils::test_session_middleware())
    }

    #[actix_web::test]
    async fn round_trips_username() {
        let app = test::init_service(
            session_test_app()
                .route(
                    "/set",
                    web::get().to(|session: SessionContext| async move {
                        let username = Username::new("shopper1").expect("fixture username");
                        session.persist_user(&username)?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: SessionContext| async move {
                        let username = session.require_username()?;
                        Ok::<_, Error>(HttpResponse::Ok().body(username.as_str().to_owned()))
                    }),
                ),
        )
        .await;

        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        assert_eq!(set_res.status(), StatusCode::OK);
        let cookie = set_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
            .expect("session cookie set");

        let get_res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/get")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(get_res.status(), StatusCode::OK);
        let body = test::read_body(get_res).await;
        assert_eq!(body, "shopper1");
    }

    #[actix_web::test]
    async fn missing_user_is_unauthorised() {
        let app = test::init_service(session_test_app().route(
            "/require",
            web::get().to(|session: SessionContext| async move {
                session.require_username()?;
                Ok::<_, Error>(HttpResponse::Ok())
            }),
        ))
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/require").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn malformed_username_is_unauthorised() {
        let app = test::init_service(
            session_test_app()
                .route(
                    "/set-invalid",
                    web::get().to(|session: Session| async move {
                        session
                            .insert(USERNAME_KEY, "two words")
                            .expect("set invalid username");
                        HttpResponse::Ok()
                    }),
                )
                .route(
                    "/require",
                    web::get().to(|session: SessionContext| async move {
                        session.require_username()?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                ),
        )
        .await;

        let set_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/set-invalid").to_request(),
        )
        .await;
        let cookie = set_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
            .expect("session cookie set");

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/require")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

