//! Sign-up, login and leaderboard handlers.
//!
//! ```text
//! POST /api/v1/signup {"username":"shopper1","email":"s@example.com","password":"…","confirmPassword":"…"}
//! POST /api/v1/login?returnUrl=/cart {"username":"shopper1","password":"…"}
//! POST /api/v1/logout
//! GET  /api/v1/leaderboard?limit=10
//! ```

use actix_web::http::header;
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use zeroize::Zeroizing;

use crate::domain::{
    Error, LeaderboardEntry, LoginCredentials, LoginValidationError, SignupForm, User,
    safe_return_url,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, LeaderboardEntrySchema, UserSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Message returned for any failed login, whichever part was wrong.
pub const LOGIN_FAILED_MESSAGE: &str = "Wrong username or password";

/// Sign-up request body for `POST /api/v1/signup`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl From<SignupRequest> for SignupForm {
    fn from(value: SignupRequest) -> Self {
        Self {
            username: value.username,
            email: value.email,
            password: Zeroizing::new(value.password),
            confirm_password: Zeroizing::new(value.confirm_password),
        }
    }
}

/// Login request body for `POST /api/v1/login`.
///
/// Example JSON:
/// `{"username":"shopper1","password":"hunter22"}`
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        let password = Zeroizing::new(value.password);
        Self::try_from_parts(&value.username, &password)
    }
}

/// Where to send the caller after a successful login.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    /// Relative path to return to; anything else falls back to `/`.
    pub return_url: Option<String>,
}

/// Leaderboard size.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Number of entries, 1 to 100; defaults to 10.
    pub limit: Option<u32>,
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::Username(inner) => Error::invalid_request(inner.to_string())
            .with_details(json!({ "field": "username", "code": "invalid_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Create an account, grant it the `user` role and sign it in.
///
/// Every form violation is reported at once in `details.messages`.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = UserSchema,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Form rejected", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "signup",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignupRequest>,
) -> ApiResult<HttpResponse> {
    let form = SignupForm::from(payload.into_inner());
    let user: User = state.bounded(state.accounts.signup(form)).await?;
    session.persist_user(&user.username)?;
    Ok(HttpResponse::Created().json(user))
}

/// Authenticate and establish a session.
///
/// Success answers `303 See Other` to the `returnUrl` query parameter when it
/// is a same-origin relative path, otherwise to `/`.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    params(LoginQuery),
    request_body = LoginRequest,
    responses(
        (status = 303, description = "Login success", headers(
            ("Set-Cookie" = String, description = "Session cookie"),
            ("Location" = String, description = "Post-login destination")
        )),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<LoginQuery>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let verified = state
        .bounded(state.credentials.verify_credentials(&credentials))
        .await?;
    if !verified {
        return Err(Error::unauthorized(LOGIN_FAILED_MESSAGE));
    }
    session.persist_user(credentials.username())?;
    let target = safe_return_url(query.return_url.as_deref());
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, target))
        .finish())
}

/// Forget the signed-in user.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Richest accounts first, ties broken by username.
#[utoipa::path(
    get,
    path = "/api/v1/leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Leaderboard", body = [LeaderboardEntrySchema]),
        (status = 400, description = "Invalid limit", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "leaderboard",
    security([])
)]
#[get("/leaderboard")]
pub async fn leaderboard(
    state: web::Data<HttpState>,
    query: web::Query<LeaderboardQuery>,
) -> ApiResult<web::Json<Vec<LeaderboardEntry>>> {
    let entries = state
        .bounded(state.accounts.leaderboard(query.limit))
        .await?;
    Ok(web::Json(entries))
}

#[cfg(test)]
mod tests;
