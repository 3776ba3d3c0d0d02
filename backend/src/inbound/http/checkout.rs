//! Checkout and purchase history handlers.
//!
//! ```text
//! GET  /api/v1/checkout
//! POST /api/v1/checkout {"total":"19.98"}
//! GET  /api/v1/purchases
//! ```
//!
//! The total is always recomputed on the server. A total sent by the client
//! is only compared against it and logged when they differ.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{CheckoutOutcome, Error, INSUFFICIENT_FUNDS_MESSAGE, PurchaseSummary};
use crate::inbound::http::ApiResult;
use crate::inbound::http::access::{RequireRoles, SignedIn};
use crate::inbound::http::cache_control::private_no_store_header;
use crate::inbound::http::schemas::{
    CheckoutOutcomeSchema, CheckoutPreviewSchema, ErrorSchema, PurchaseSummarySchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_optional_money};

/// Checkout body. The whole request body is optional.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CheckoutRequest {
    /// Total the client displayed; advisory only.
    #[schema(example = "19.98")]
    pub total: Option<String>,
}

/// What the checkout page shows before confirmation.
#[utoipa::path(
    get,
    path = "/api/v1/checkout",
    responses(
        (status = 200, description = "Checkout preview", body = CheckoutPreviewSchema),
        (status = 303, description = "Login required"),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["checkout"],
    operation_id = "previewCheckout"
)]
#[get("/checkout", wrap = "RequireRoles::user()")]
pub async fn preview(state: web::Data<HttpState>, signed_in: SignedIn) -> ApiResult<HttpResponse> {
    let summary = state
        .bounded(state.checkout.preview(signed_in.0.user_id))
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_store_header())
        .json(summary))
}

/// Debit the balance, record purchases, apply perks and clear the cart.
///
/// An uncovered total answers `409` with code `conflict`, the message
/// `Insufficient funds` and the balance and total in `details`; nothing is
/// changed in that case.
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body(content = CheckoutRequest, description = "Optional client total"),
    responses(
        (status = 200, description = "Checkout completed", body = CheckoutOutcomeSchema),
        (status = 303, description = "Login required"),
        (status = 400, description = "Empty cart or malformed total", body = ErrorSchema),
        (status = 409, description = "Insufficient funds or cart changed", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["checkout"],
    operation_id = "checkout"
)]
#[post("/checkout", wrap = "RequireRoles::user()")]
pub async fn checkout(
    state: web::Data<HttpState>,
    signed_in: SignedIn,
    payload: Option<web::Json<CheckoutRequest>>,
) -> ApiResult<web::Json<CheckoutOutcome>> {
    let request = payload.map(web::Json::into_inner).unwrap_or_default();
    let client_total = parse_optional_money(request.total.as_deref(), FieldName::new("total"))?;
    let outcome = state
        .bounded(state.checkout.checkout(signed_in.0.user_id, client_total))
        .await?;
    match outcome {
        CheckoutOutcome::InsufficientFunds { balance, total } => {
            Err(Error::conflict(INSUFFICIENT_FUNDS_MESSAGE).with_details(json!({
                "code": "insufficient_funds",
                "balance": balance,
                "total": total,
            })))
        }
        completed @ CheckoutOutcome::Completed(_) => Ok(web::Json(completed)),
    }
}

/// Purchases aggregated per product, most recent first.
#[utoipa::path(
    get,
    path = "/api/v1/purchases",
    responses(
        (status = 200, description = "Purchase history", body = [PurchaseSummarySchema]),
        (status = 303, description = "Login required"),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["checkout"],
    operation_id = "purchaseHistory"
)]
#[get("/purchases", wrap = "RequireRoles::user()")]
pub async fn purchases(
    state: web::Data<HttpState>,
    signed_in: SignedIn,
) -> ApiResult<web::Json<Vec<PurchaseSummary>>> {
    let history = state
        .bounded(state.checkout.purchase_history(signed_in.0.user_id))
        .await?;
    Ok(web::Json(history))
}

#[cfg(test)]
#[path = "checkout_tests.rs"]
mod tests;
