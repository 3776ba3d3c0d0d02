//! Tests for server bootstrap and app wiring.

use super::*;
use actix_web::cookie::{Key, SameSite};
use actix_web::http::{StatusCode, header};
use actix_web::test;
use rstest::{fixture, rstest};
use serde_json::json;
use storefront::domain::TRACE_ID_HEADER;
use storefront::inbound::http::session::SESSION_COOKIE_NAME;
use storefront::inbound::http::session_config::SessionSettings;

#[fixture]
fn health_state() -> web::Data<HealthState> {
    web::Data::new(HealthState::new())
}

#[fixture]
fn config() -> ServerConfig {
    ServerConfig::new(
        SessionSettings {
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
            ttl_hours: 2,
        },
        "127.0.0.1:0".parse().expect("literal address"),
    )
}

fn dependencies(health_state: web::Data<HealthState>, config: &ServerConfig) -> AppDependencies {
    AppDependencies {
        health_state,
        http_state: build_http_state(config),
        session: config.session.clone(),
    }
}

#[rstest]
#[actix_rt::test]
async fn create_server_marks_ready(health_state: web::Data<HealthState>, config: ServerConfig) {
    assert!(!health_state.is_ready(), "state should start unready");
    assert_eq!(config.bind_addr().port(), 0);
    let http_state = build_http_state(&config);

    let _server = create_server(health_state.clone(), http_state, config)
        .expect("server should build");

    assert!(
        health_state.is_ready(),
        "server creation should mark readiness"
    );
}

#[rstest]
#[actix_rt::test]
async fn signup_issues_a_private_session_cookie(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) {
    let ttl_hours = config.session.ttl_hours();
    let app = test::init_service(build_app(dependencies(health_state, &config))).await;

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/signup")
            .set_json(json!({
                "username": "shopper1",
                "email": "shopper1@example.com",
                "password": "hunter22",
                "confirmPassword": "hunter22",
            }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key(TRACE_ID_HEADER));
    let cookie = response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .expect("session cookie");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(
        cookie.max_age(),
        Some(actix_web::cookie::time::Duration::hours(i64::from(ttl_hours)))
    );
    assert!(
        !cookie.value().contains("shopper1"),
        "cookie content is encrypted"
    );

    let account = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/account")
            .cookie(cookie.into_owned())
            .to_request(),
    )
    .await;
    assert_eq!(account.status(), StatusCode::OK);
}

#[rstest]
#[actix_rt::test]
async fn anonymous_cart_access_redirects_to_login(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) {
    let app = test::init_service(build_app(dependencies(health_state, &config))).await;

    let response = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/cart").to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok());
    assert_eq!(location, Some("/login?returnUrl=%2Fapi%2Fv1%2Fcart"));
}

#[rstest]
#[case("/health/live", StatusCode::OK)]
#[case("/health/ready", StatusCode::SERVICE_UNAVAILABLE)]
#[case("/api/v1/products", StatusCode::OK)]
#[actix_rt::test]
async fn public_routes_are_wired(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
    #[case] uri: &str,
    #[case] expected: StatusCode,
) {
    let app = test::init_service(build_app(dependencies(health_state, &config))).await;

    let response = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;

    assert_eq!(response.status(), expected);
}
