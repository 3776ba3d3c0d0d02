//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::test::TestRequest;
use actix_web::{App, web};
use mockable::DefaultClock;
use zeroize::Zeroizing;

use crate::domain::{Money, ProductDraft, ProductId, RoleName, SignupForm, User, Username};
use crate::inbound::http::configure_api;
use crate::inbound::http::session::{SESSION_COOKIE_NAME, SessionCookiePolicy};
use crate::inbound::http::state::{HttpState, HttpStatePorts, Repositories};
use crate::outbound::hashing::BcryptPasswordHasher;
use crate::outbound::memory::InMemoryStore;

/// Password given to every account created by [`signed_up`].
pub const TEST_PASSWORD: &str = "hunter22";

/// Session middleware with a fresh key and no `Secure` flag, for plain HTTP
/// test requests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionCookiePolicy::new(Key::generate(), 2)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .middleware()
}

/// State over a fresh in-memory store, with the store for direct seeding.
pub fn memory_state_with_store() -> (HttpState, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let ports = HttpStatePorts::from_repositories(
        Repositories {
            users: store.clone(),
            roles: store.clone(),
            products: store.clone(),
            carts: store.clone(),
            ledger: store.clone(),
        },
        Arc::new(BcryptPasswordHasher::with_cost(4)),
        Arc::new(DefaultClock),
    );
    (HttpState::new(ports), store)
}

/// State over a fresh in-memory store.
pub fn memory_state() -> HttpState {
    memory_state_with_store().0
}

/// Sign up `username` with [`TEST_PASSWORD`], optionally granting admin.
pub async fn signed_up(state: &HttpState, username: &str, admin: bool) -> User {
    let user = state
        .accounts
        .signup(SignupForm {
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            password: Zeroizing::new(TEST_PASSWORD.to_owned()),
            confirm_password: Zeroizing::new(TEST_PASSWORD.to_owned()),
        })
        .await
        .expect("signup succeeds");
    if admin {
        state
            .roles
            .grant_role(user.id, &RoleName::admin())
            .await
            .expect("grant admin");
    }
    user
}

/// Add a product through the catalogue.
pub async fn listed_product(
    state: &HttpState,
    name: &str,
    price_cents: Option<i64>,
    quantity: Option<u32>,
) -> ProductId {
    let price = price_cents.map(|cents| Money::from_cents(cents).expect("non-negative price"));
    let draft = ProductDraft::new(name, Some("test product"), price, quantity).expect("draft");
    state
        .catalogue
        .create_product(draft)
        .await
        .expect("product created")
        .id
}

/// Parse a username fixture.
pub fn username(raw: &str) -> Username {
    Username::new(raw).expect("valid username")
}

/// The `session` cookie set by a response.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// The full `/api/v1` surface over `state`, behind a test session cookie.
pub fn api_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .service(web::scope("/api/v1").configure(configure_api))
}

/// `POST /api/v1/login` for `username` with [`TEST_PASSWORD`].
pub fn login_request(username: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/v1/login")
        .set_json(serde_json::json!({ "username": username, "password": TEST_PASSWORD }))
}

/// Build [`api_app`] with `shopper1` signed up (optionally as admin) and
/// signed in, yielding `(state, app, cookie)`.
macro_rules! signed_in_app {
    ($admin:expr) => {{
        let state = $crate::inbound::http::test_utils::memory_state();
        $crate::inbound::http::test_utils::signed_up(&state, "shopper1", $admin).await;
        let app = actix_web::test::init_service($crate::inbound::http::test_utils::api_app(
            state.clone(),
        ))
        .await;
        let login_res = actix_web::test::call_service(
            &app,
            $crate::inbound::http::test_utils::login_request("shopper1").to_request(),
        )
        .await;
        let cookie = $crate::inbound::http::test_utils::session_cookie(&login_res);
        (state, app, cookie)
    }};
}
pub(crate) use signed_in_app;
