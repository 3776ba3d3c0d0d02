//! Server harness and shared world for storefront behaviour tests.
//!
//! The harness owns a single-threaded Tokio runtime plus a `LocalSet` because
//! Actix uses `spawn_local` internally. The `WorldFixture` ensures the server
//! is stopped even if a test panics. Every world runs over a fresh in-memory
//! store so scenarios never share accounts or stock.

use std::cell::RefCell;
use std::collections::HashMap;
use std::net::TcpListener;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::cookie::{Key, SameSite};
use actix_web::dev::ServerHandle;
use actix_web::http::{Method, header};
use actix_web::{App, HttpServer, web};
use awc::Client;
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::Value;
use storefront::Trace;
use storefront::domain::{Money, ProductDraft, ProductId, SignupForm, TRACE_ID_HEADER, Username};
use storefront::inbound::http::configure_api;
use storefront::inbound::http::session::{SESSION_COOKIE_NAME, SessionCookiePolicy};
use storefront::inbound::http::state::{HttpState, HttpStatePorts, Repositories};
use storefront::outbound::hashing::BcryptPasswordHasher;
use storefront::outbound::memory::InMemoryStore;
use tokio::runtime::Runtime;
use tokio::task::LocalSet;
use zeroize::Zeroizing;

/// Password used for every account the harness creates.
pub(crate) const PASSWORD: &str = "hunter22";

pub(crate) struct StoreWorld {
    pub(crate) runtime: Runtime,
    pub(crate) local: LocalSet,
    pub(crate) base_url: String,
    pub(crate) server: ServerHandle,
    pub(crate) state: HttpState,
    pub(crate) products: HashMap<String, ProductId>,
    pub(crate) last_status: Option<u16>,
    pub(crate) last_body: Option<Value>,
    pub(crate) last_location: Option<String>,
    pub(crate) last_trace_id: Option<String>,
    pub(crate) session_cookie: Option<String>,
}

pub(crate) type SharedWorld = Rc<RefCell<StoreWorld>>;

pub(crate) struct WorldFixture {
    world: SharedWorld,
}

impl WorldFixture {
    pub(crate) fn world(&self) -> SharedWorld {
        self.world.clone()
    }
}

impl Drop for WorldFixture {
    fn drop(&mut self) {
        shutdown(self.world.clone());
    }
}

pub(crate) fn shutdown(world: SharedWorld) {
    // `LocalSet` must be driven on the thread that owns it, so we lock the world
    // while calling `block_on`. The future must not try to lock the world.
    let ctx = world.borrow();
    let server = ctx.server.clone();
    ctx.local.block_on(&ctx.runtime, async move {
        server.stop(true).await;
    });
}

pub(crate) fn with_world_async<R, F>(world: &SharedWorld, operation: impl FnOnce(String) -> F) -> R
where
    F: std::future::Future<Output = R>,
{
    let ctx = world.borrow();
    let base_url = ctx.base_url.clone();
    ctx.local.block_on(&ctx.runtime, operation(base_url))
}

/// A call against the running server.
pub(crate) struct RequestSpec<'a> {
    pub(crate) method: Method,
    pub(crate) path: &'a str,
    pub(crate) payload: Option<Value>,
    pub(crate) with_session: bool,
}

impl<'a> RequestSpec<'a> {
    pub(crate) fn get(path: &'a str) -> Self {
        Self {
            method: Method::GET,
            path,
            payload: None,
            with_session: true,
        }
    }

    pub(crate) fn post(path: &'a str, payload: Option<Value>) -> Self {
        Self {
            method: Method::POST,
            path,
            payload,
            with_session: true,
        }
    }

    pub(crate) fn anonymous(mut self) -> Self {
        self.with_session = false;
        self
    }
}

/// Send a request, record the response and keep any re-issued session cookie.
pub(crate) fn perform(world: &SharedWorld, spec: RequestSpec<'_>) {
    let RequestSpec {
        method,
        path,
        payload,
        with_session,
    } = spec;
    let cookie = if with_session {
        world.borrow().session_cookie.clone()
    } else {
        None
    };
    let label = format!("{method} {path}");
    let (status, location, trace_id, set_cookie, body) =
        with_world_async(world, |base_url| async move {
            let client = Client::builder().disable_redirects().finish();
            let mut request = client.request(method, format!("{base_url}{path}"));
            if let Some(cookie) = cookie {
                request = request.insert_header((header::COOKIE, cookie));
            }
            let mut response = match payload {
                Some(payload) => request.send_json(&payload).await.expect(&label),
                None => request.send().await.expect(&label),
            };
            let header_value = |name: header::HeaderName| {
                response
                    .headers()
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned)
            };
            let location = header_value(header::LOCATION);
            let trace_id = header_value(header::HeaderName::from_static(TRACE_ID_HEADER));
            let set_cookie = header_value(header::SET_COOKIE);
            let status = response.status().as_u16();
            let bytes = response.body().await.expect(&label);
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).expect("JSON body")
            };
            (status, location, trace_id, set_cookie, body)
        });

    let mut ctx = world.borrow_mut();
    ctx.last_status = Some(status);
    ctx.last_location = location;
    ctx.last_trace_id = trace_id;
    ctx.last_body = Some(body);
    if let Some(pair) = set_cookie
        .as_deref()
        .and_then(|raw| raw.split(';').next())
        .filter(|pair| {
            pair.split_once('=')
                .is_some_and(|(name, _)| name == SESSION_COOKIE_NAME)
        })
    {
        ctx.session_cookie = Some(pair.to_owned());
    }
}

/// Create an account directly through the account service.
pub(crate) fn seed_account(world: &SharedWorld, username: &str) {
    let state = world.borrow().state.clone();
    let username = username.to_owned();
    with_world_async(world, |_| async move {
        state
            .accounts
            .signup(SignupForm {
                email: format!("{username}@example.com"),
                username,
                password: Zeroizing::new(PASSWORD.to_owned()),
                confirm_password: Zeroizing::new(PASSWORD.to_owned()),
            })
            .await
            .expect("seeded account");
    });
}

/// Credit `username` with `clicks` whole currency units.
pub(crate) fn seed_balance(world: &SharedWorld, username: &str, clicks: u32) {
    let state = world.borrow().state.clone();
    let username = Username::new(username).expect("valid username");
    with_world_async(world, |_| async move {
        state
            .accounts
            .earn(&username, clicks)
            .await
            .expect("balance credited");
    });
}

/// List a product and remember its id under `name`.
pub(crate) fn seed_product(world: &SharedWorld, name: &str, price_cents: i64, stock: Option<u32>) {
    let state = world.borrow().state.clone();
    let price = Money::from_cents(price_cents).expect("non-negative price");
    let draft = ProductDraft::new(name, Some("seeded"), Some(price), stock).expect("draft");
    let id = with_world_async(world, |_| async move {
        state
            .catalogue
            .create_product(draft)
            .await
            .expect("product listed")
            .id
    });
    world.borrow_mut().products.insert(name.to_owned(), id);
}

pub(crate) fn product_id(world: &SharedWorld, name: &str) -> ProductId {
    *world.borrow().products.get(name).expect("seeded product")
}

/// Units of `name` currently in stock.
pub(crate) fn stock_of(world: &SharedWorld, name: &str) -> Option<u32> {
    let state = world.borrow().state.clone();
    let id = product_id(world, name);
    with_world_async(world, |_| async move {
        state.catalogue.product(id).await.expect("product").quantity
    })
}

async fn spawn_store_server(http_state: HttpState) -> Result<(String, ServerHandle), String> {
    let session = SessionCookiePolicy::new(Key::generate(), 2)
        .with_secure(false)
        .with_same_site(SameSite::Lax);
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;

    let http_data = web::Data::new(http_state);

    let server = HttpServer::new(move || {
        let api = web::scope("/api/v1")
            .wrap(session.middleware())
            .configure(configure_api);

        App::new()
            .app_data(http_data.clone())
            .wrap(Trace)
            .service(api)
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .map_err(|err| err.to_string())?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    Ok((format!("http://{addr}"), handle))
}

fn create_runtime_and_local() -> (Runtime, LocalSet) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let local = LocalSet::new();

    (runtime, local)
}

fn memory_state() -> HttpState {
    let store = Arc::new(InMemoryStore::new());
    HttpState::new(HttpStatePorts::from_repositories(
        Repositories {
            users: store.clone(),
            roles: store.clone(),
            products: store.clone(),
            carts: store.clone(),
            ledger: store,
        },
        Arc::new(BcryptPasswordHasher::with_cost(4)),
        Arc::new(DefaultClock),
    ))
}

#[fixture]
pub(crate) fn world() -> WorldFixture {
    let (runtime, local) = create_runtime_and_local();
    let state = memory_state();
    let server_state = state.clone();

    let (base_url, server) = local
        .block_on(&runtime, async { spawn_store_server(server_state).await })
        .expect("server should start");

    let world = Rc::new(RefCell::new(StoreWorld {
        runtime,
        local,
        base_url,
        server,
        state,
        products: HashMap::new(),
        last_status: None,
        last_body: None,
        last_location: None,
        last_trace_id: None,
        session_cookie: None,
    }));

    WorldFixture { world }
}
