//! Account handlers for the signed-in user.
//!
//! ```text
//! GET    /api/v1/account
//! PUT    /api/v1/account {"email":"new@example.com","password":"…","confirmPassword":"…"}
//! DELETE /api/v1/account
//! POST   /api/v1/earn {"clicks":10}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::{AccountUpdateForm, Money};
use crate::inbound::http::ApiResult;
use crate::inbound::http::access::{RequireRoles, SignedIn};
use crate::inbound::http::cache_control::private_no_store_header;
use crate::inbound::http::schemas::{AccountDetailsSchema, ErrorSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error};

/// Account edit body; blank or absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdateRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl From<AccountUpdateRequest> for AccountUpdateForm {
    fn from(value: AccountUpdateRequest) -> Self {
        Self {
            email: value.email,
            password: value.password.map(Zeroizing::new),
            confirm_password: value.confirm_password.map(Zeroizing::new),
        }
    }
}

/// Earn request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct EarnRequest {
    /// Clicks to cash in, 1 to 100. Each is worth 1.00 times the multiplier.
    pub clicks: Option<u32>,
}

/// Balance after an earn request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    /// New balance.
    #[schema(value_type = String, example = "12.00")]
    pub balance: Money,
}

/// The signed-in user's account, roles and aggregated purchases.
#[utoipa::path(
    get,
    path = "/api/v1/account",
    responses(
        (status = 200, description = "Account details", body = AccountDetailsSchema),
        (status = 303, description = "Login required"),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["account"],
    operation_id = "getAccount"
)]
#[get("/account", wrap = "RequireRoles::user_or_admin()")]
pub async fn get_account(
    state: web::Data<HttpState>,
    signed_in: SignedIn,
) -> ApiResult<HttpResponse> {
    let details = state
        .bounded(state.accounts.account_details(&signed_in.0.username))
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_store_header())
        .json(details))
}

/// Change the email and/or password.
#[utoipa::path(
    put,
    path = "/api/v1/account",
    request_body = AccountUpdateRequest,
    responses(
        (status = 204, description = "Account updated"),
        (status = 303, description = "Login required"),
        (status = 400, description = "Form rejected", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["account"],
    operation_id = "updateAccount"
)]
#[put("/account", wrap = "RequireRoles::user_or_admin()")]
pub async fn update_account(
    state: web::Data<HttpState>,
    signed_in: SignedIn,
    payload: web::Json<AccountUpdateRequest>,
) -> ApiResult<HttpResponse> {
    let form = AccountUpdateForm::from(payload.into_inner());
    state
        .bounded(state.accounts.update_account(&signed_in.0.username, form))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete the account, its roles, cart and purchase history, then sign out.
///
/// Reserved cart stock is not returned to the catalogue.
#[utoipa::path(
    delete,
    path = "/api/v1/account",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 303, description = "Login required"),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["account"],
    operation_id = "deleteAccount"
)]
#[delete("/account", wrap = "RequireRoles::user()")]
pub async fn delete_account(
    state: web::Data<HttpState>,
    session: SessionContext,
    signed_in: SignedIn,
) -> ApiResult<HttpResponse> {
    state
        .bounded(state.accounts.delete_account(&signed_in.0.username))
        .await?;
    session.clear();
    Ok(HttpResponse::NoContent().finish())
}

/// Credit the balance for a batch of clicks.
#[utoipa::path(
    post,
    path = "/api/v1/earn",
    request_body = EarnRequest,
    responses(
        (status = 200, description = "New balance", body = BalanceResponse),
        (status = 303, description = "Login required"),
        (status = 400, description = "Invalid click count", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["account"],
    operation_id = "earn"
)]
#[post("/earn", wrap = "RequireRoles::user()")]
pub async fn earn(
    state: web::Data<HttpState>,
    signed_in: SignedIn,
    payload: web::Json<EarnRequest>,
) -> ApiResult<web::Json<BalanceResponse>> {
    let clicks = payload
        .clicks
        .ok_or_else(|| missing_field_error(FieldName::new("clicks")))?;
    let balance = state
        .bounded(state.accounts.earn(&signed_in.0.username, clicks))
        .await?;
    Ok(web::Json(BalanceResponse { balance }))
}
