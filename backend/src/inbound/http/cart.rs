//! Shopping cart handlers.
//!
//! ```text
//! GET    /api/v1/cart
//! POST   /api/v1/cart/items {"productId":3,"quantity":2}
//! DELETE /api/v1/cart/items/{productId}
//! ```
//!
//! Adding reserves stock straight away; removing a line gives it back.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{AddToCartOutcome, CartLine, Error, Money, ProductId, cart_total};
use crate::inbound::http::ApiResult;
use crate::inbound::http::access::{RequireRoles, SignedIn};
use crate::inbound::http::cache_control::private_no_store_header;
use crate::inbound::http::schemas::{AddToCartOutcomeSchema, CartLineSchema, ErrorSchema};
use crate::inbound::http::state::HttpState;

/// Add-to-cart body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: i64,
    /// Units to reserve; at least 1. Defaults to 1.
    pub quantity: Option<i64>,
}

/// Cart contents with the total at current prices.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    #[schema(value_type = Vec<CartLineSchema>)]
    pub lines: Vec<CartLine>,
    #[schema(value_type = String, example = "19.98")]
    pub total: Money,
}

/// Units returned to stock by a removal.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReleasedResponse {
    pub released: u32,
}

fn requested_quantity(raw: Option<i64>) -> Result<u32, Error> {
    let quantity = raw.unwrap_or(1);
    u32::try_from(quantity)
        .ok()
        .filter(|quantity| *quantity > 0)
        .ok_or_else(|| {
            Error::invalid_request("quantity must be at least 1")
                .with_details(json!({ "field": "quantity", "value": quantity }))
        })
}

/// The signed-in user's cart.
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    responses(
        (status = 200, description = "Cart contents", body = CartResponse),
        (status = 303, description = "Login required"),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["cart"],
    operation_id = "getCart"
)]
#[get("/cart", wrap = "RequireRoles::user()")]
pub async fn get_cart(state: web::Data<HttpState>, signed_in: SignedIn) -> ApiResult<HttpResponse> {
    let lines = state
        .bounded(state.cart.cart_items(signed_in.0.user_id))
        .await?;
    let total = cart_total(&lines)?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_store_header())
        .json(CartResponse { lines, total }))
}

/// Reserve stock and add it to the cart.
///
/// Insufficient stock answers `409` with code `out_of_stock`; nothing is
/// reserved in that case.
#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Stock reserved", body = AddToCartOutcomeSchema),
        (status = 303, description = "Login required"),
        (status = 400, description = "Invalid quantity or product not for sale", body = ErrorSchema),
        (status = 404, description = "No such product", body = ErrorSchema),
        (status = 409, description = "Out of stock", body = ErrorSchema)
    ),
    tags = ["cart"],
    operation_id = "addToCart"
)]
#[post("/cart/items", wrap = "RequireRoles::user()")]
pub async fn add_item(
    state: web::Data<HttpState>,
    signed_in: SignedIn,
    payload: web::Json<AddItemRequest>,
) -> ApiResult<web::Json<AddToCartOutcome>> {
    let product_id = ProductId::new(payload.product_id);
    let quantity = requested_quantity(payload.quantity)?;
    let outcome = state
        .bounded(
            state
                .cart
                .add_to_cart(signed_in.0.user_id, product_id, quantity),
        )
        .await?;
    match outcome {
        AddToCartOutcome::OutOfStock {
            requested,
            available,
        } => Err(Error::out_of_stock(format!(
            "only {available} left in stock, {requested} requested"
        ))
        .with_details(json!({
            "productId": product_id,
            "requested": requested,
            "available": available,
        }))),
        reserved @ AddToCartOutcome::Reserved { .. } => Ok(web::Json(reserved)),
    }
}

/// Remove a product from the cart and return its units to stock.
#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{productId}",
    params(("productId" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Line removed", body = ReleasedResponse),
        (status = 303, description = "Login required"),
        (status = 404, description = "Product not in cart", body = ErrorSchema)
    ),
    tags = ["cart"],
    operation_id = "removeFromCart"
)]
#[delete("/cart/items/{product_id}", wrap = "RequireRoles::user()")]
pub async fn remove_item(
    state: web::Data<HttpState>,
    signed_in: SignedIn,
    path: web::Path<i64>,
) -> ApiResult<web::Json<ReleasedResponse>> {
    let product_id = ProductId::new(path.into_inner());
    let released = state
        .bounded(state.cart.remove_from_cart(signed_in.0.user_id, product_id))
        .await?;
    Ok(web::Json(ReleasedResponse { released }))
}
