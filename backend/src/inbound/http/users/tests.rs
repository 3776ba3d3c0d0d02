//! Tests for sign-up, login and leaderboard handlers.

use super::*;
use crate::domain::forms::{FORM_REJECTION_HEADER, PASSWORDS_DIFFER, USERNAME_TAKEN};
use crate::inbound::http::test_utils::{
    api_app, login_request, memory_state, memory_state_with_store, session_cookie, signed_up,
    username,
};
use crate::domain::ports::UserRepository;
use crate::domain::Money;
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::Value;

fn signup_body(username: &str, password: &str, confirm: &str) -> SignupRequest {
    SignupRequest {
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        password: password.to_owned(),
        confirm_password: confirm.to_owned(),
    }
}

fn messages(value: &Value) -> Vec<String> {
    value
        .pointer("/details/messages")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[actix_web::test]
async fn signup_creates_account_and_signs_it_in() {
    let state = memory_state();
    let app = actix_test::init_service(api_app(state.clone())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/signup")
            .set_json(signup_body("shopper1", "hunter22", "hunter22"))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(&response);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.get("username").and_then(Value::as_str), Some("shopper1"));
    assert_eq!(body.get("balance").and_then(Value::as_str), Some("0.00"));
    assert_eq!(body.get("multiplier").and_then(Value::as_u64), Some(1));

    let account = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/account")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(account.status(), StatusCode::OK);
}

#[actix_web::test]
async fn signup_reports_every_violation() {
    let app = actix_test::init_service(api_app(memory_state())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/signup")
            .set_json(signup_body("abc", "short", "other"))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some(FORM_REJECTION_HEADER)
    );
    let reported = messages(&body);
    assert_eq!(reported.len(), 3);
    assert!(reported.iter().any(|message| message == PASSWORDS_DIFFER));
}

#[actix_web::test]
async fn signup_rejects_taken_username() {
    let state = memory_state();
    signed_up(&state, "shopper1", false).await;
    let app = actix_test::init_service(api_app(state)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/signup")
            .set_json(signup_body("shopper1", "hunter22", "hunter22"))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(messages(&body), vec![USERNAME_TAKEN.to_owned()]);
}

#[rstest]
#[case(Some("/cart?page=2"), "/cart?page=2")]
#[case(Some("//evil.example"), "/")]
#[case(Some("https://evil.example/"), "/")]
#[case(None, "/")]
#[actix_web::test]
async fn login_redirects_only_to_relative_paths(
    #[case] return_url: Option<&str>,
    #[case] expected: &str,
) {
    let state = memory_state();
    signed_up(&state, "shopper1", false).await;
    let app = actix_test::init_service(api_app(state)).await;
    let uri = match return_url {
        Some(target) => format!(
            "/api/v1/login?{}",
            url::form_urlencoded::Serializer::new(String::new())
                .append_pair("returnUrl", target)
                .finish()
        ),
        None => "/api/v1/login".to_owned(),
    };

    let response =
        actix_test::call_service(&app, login_request("shopper1").uri(&uri).to_request()).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some(expected)
    );
    session_cookie(&response);
}

#[rstest]
#[case("shopper1", "wrong-password")]
#[case("nobody01", "hunter22")]
#[actix_web::test]
async fn failed_login_does_not_say_which_part_was_wrong(
    #[case] name: &str,
    #[case] password: &str,
) {
    let state = memory_state();
    signed_up(&state, "shopper1", false).await;
    let app = actix_test::init_service(api_app(state)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(LoginRequest {
                username: name.to_owned(),
                password: password.to_owned(),
            })
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some(LOGIN_FAILED_MESSAGE)
    );
}

#[rstest]
#[case("   ", "password", "username", "invalid_username")]
#[case("shopper1", "", "password", "empty_password")]
#[actix_web::test]
async fn malformed_login_is_rejected(
    #[case] name: &str,
    #[case] password: &str,
    #[case] field: &str,
    #[case] code: &str,
) {
    let app = actix_test::init_service(api_app(memory_state())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(LoginRequest {
                username: name.to_owned(),
                password: password.to_owned(),
            })
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.pointer("/details/field").and_then(Value::as_str), Some(field));
    assert_eq!(body.pointer("/details/code").and_then(Value::as_str), Some(code));
}

#[actix_web::test]
async fn logout_forgets_the_user() {
    let state = memory_state();
    signed_up(&state, "shopper1", false).await;
    let app = actix_test::init_service(api_app(state)).await;
    let login_res = actix_test::call_service(&app, login_request("shopper1").to_request()).await;

    let logout_res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/logout")
            .cookie(session_cookie(&login_res))
            .to_request(),
    )
    .await;

    assert_eq!(logout_res.status(), StatusCode::NO_CONTENT);
    let cleared = session_cookie(&logout_res);
    assert!(cleared.value().is_empty());
}

#[actix_web::test]
async fn leaderboard_orders_by_balance() {
    let (state, store) = memory_state_with_store();
    let poor = signed_up(&state, "poorest1", false).await;
    let rich = signed_up(&state, "richest1", false).await;
    store
        .credit_balance(rich.id, Money::from_cents(50_000).expect("amount"))
        .await
        .expect("credit");
    store
        .credit_balance(poor.id, Money::from_cents(100).expect("amount"))
        .await
        .expect("credit");
    let app = actix_test::init_service(api_app(state)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/leaderboard?limit=1")
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Vec<LeaderboardEntry> = actix_test::read_body_json(response).await;
    assert_eq!(body.len(), 1);
    assert_eq!(body.first().map(|entry| entry.username.clone()), Some(username("richest1")));
}

#[rstest]
#[case("0")]
#[case("101")]
#[actix_web::test]
async fn leaderboard_limit_is_bounded(#[case] limit: &str) {
    let app = actix_test::init_service(api_app(memory_state())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/leaderboard?limit={limit}"))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
