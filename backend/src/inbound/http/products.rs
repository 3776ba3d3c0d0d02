//! Product catalogue handlers.
//!
//! ```text
//! GET    /api/v1/products?searchTerm=mug&page=1&pageSize=10&orderBy=price&direction=desc
//! GET    /api/v1/products/{id}
//! POST   /api/v1/products {"name":"Mug","description":"…","price":"9.99","quantity":5}
//! PUT    /api/v1/products/{id}
//! DELETE /api/v1/products/{id}?force=true
//! POST   /api/v1/products/{id}/stock {"delta":-2}
//! ```
//!
//! Reads are public. Unlisted products (no price, or no stock left) are
//! shown only to administrators who ask for them with `includeUnlisted`.

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use pagination::{Page, PageLinks};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::StockAdjustment;
use crate::domain::{Error, Identity, Product, ProductDraft, ProductId, ProductSearch, RoleName};
use crate::inbound::http::ApiResult;
use crate::inbound::http::access::RequireRoles;
use crate::inbound::http::schemas::{ErrorSchema, ProductSchema, StockAdjustmentSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_optional_money};

/// Catalogue query parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Case-insensitive substring of the name or description.
    pub search_term: Option<String>,
    /// 1-indexed page number.
    pub page: Option<u32>,
    /// Items per page, 1 to 100.
    pub page_size: Option<u32>,
    /// `id`, `name`, `description`, `price` or `quantity`.
    pub order_by: Option<String>,
    /// `asc` or `desc`.
    pub direction: Option<String>,
    /// Admin only: include unpriced and sold-out products.
    pub include_unlisted: Option<bool>,
}

/// One page of products plus navigation links.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPageResponse {
    #[schema(value_type = Vec<ProductSchema>)]
    pub items: Vec<Product>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u64,
    #[schema(value_type = Object)]
    pub links: PageLinks,
}

impl ProductPageResponse {
    fn new(page: Page<Product>, links: PageLinks) -> Self {
        Self {
            page: page.page(),
            page_size: page.page_size(),
            total_items: page.total_items(),
            total_pages: page.total_pages(),
            items: page.into_items(),
            links,
        }
    }
}

/// Product create/update body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ProductRequest {
    /// 1 to 100 characters after trimming.
    pub name: String,
    /// Up to 1000 characters.
    pub description: Option<String>,
    /// Decimal amount; omit to withdraw the product from sale.
    #[schema(example = "9.99")]
    pub price: Option<String>,
    /// Units in stock; omit for unlimited stock.
    pub quantity: Option<i64>,
}

impl TryFrom<ProductRequest> for ProductDraft {
    type Error = Error;

    fn try_from(value: ProductRequest) -> Result<Self, Self::Error> {
        let price = parse_optional_money(value.price.as_deref(), FieldName::new("price"))?;
        let quantity = value
            .quantity
            .map(|raw| {
                u32::try_from(raw)
                    .map_err(|_| Error::invalid_request("quantity must be zero or more"))
            })
            .transpose()?;
        ProductDraft::new(&value.name, value.description.as_deref(), price, quantity)
    }
}

/// Delete options.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    /// Also remove cart lines and purchase records that reference the product.
    pub force: Option<bool>,
}

/// Stock adjustment body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StockRequest {
    /// Units to add (positive) or remove (negative).
    pub delta: i64,
}

fn is_admin(identity: Option<&Identity>) -> bool {
    identity.is_some_and(|identity| identity.roles.contains(&RoleName::admin()))
}

async fn caller(state: &HttpState, session: &SessionContext) -> Result<Option<Identity>, Error> {
    let username = session.username()?;
    state.bounded(state.access.resolve(username.as_ref())).await
}

/// Search the catalogue.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Matching products", body = ProductPageResponse),
        (status = 400, description = "Invalid query", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "searchProducts",
    security([])
)]
#[get("/products")]
pub async fn search_products(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    query: web::Query<ProductQuery>,
) -> ApiResult<web::Json<ProductPageResponse>> {
    let query = query.into_inner();
    let include_unlisted = if query.include_unlisted.unwrap_or(false) {
        is_admin(caller(&state, &session).await?.as_ref())
    } else {
        false
    };
    let search = ProductSearch::from_parts(
        query.search_term.as_deref(),
        query.page,
        query.page_size,
        query.order_by.as_deref(),
        query.direction.as_deref(),
    )?
    .including_unlisted(include_unlisted);
    let page = state.bounded(state.catalogue.search(&search)).await?;
    let links = page.links(&request.full_url());
    Ok(web::Json(ProductPageResponse::new(page, links)))
}

/// Fetch one product. Unlisted products are visible to administrators only.
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductSchema),
        (status = 404, description = "No such product", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "getProduct",
    security([])
)]
#[get("/products/{id}")]
pub async fn get_product(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<Product>> {
    let id = ProductId::new(path.into_inner());
    let product = state.bounded(state.catalogue.product(id)).await?;
    if !product.is_listed() && !is_admin(caller(&state, &session).await?.as_ref()) {
        return Err(Error::not_found(format!("product {id} not found")));
    }
    Ok(web::Json(product))
}

/// Add a product.
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductSchema),
        (status = 303, description = "Administrator login required"),
        (status = 400, description = "Invalid product", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "createProduct"
)]
#[post("/products", wrap = "RequireRoles::admin()")]
pub async fn create_product(
    state: web::Data<HttpState>,
    payload: web::Json<ProductRequest>,
) -> ApiResult<HttpResponse> {
    let draft = ProductDraft::try_from(payload.into_inner())?;
    let product = state.bounded(state.catalogue.create_product(draft)).await?;
    Ok(HttpResponse::Created().json(product))
}

/// Replace a product's fields.
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductSchema),
        (status = 303, description = "Administrator login required"),
        (status = 400, description = "Invalid product", body = ErrorSchema),
        (status = 404, description = "No such product", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "updateProduct"
)]
#[put("/products/{id}", wrap = "RequireRoles::admin()")]
pub async fn update_product(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<ProductRequest>,
) -> ApiResult<web::Json<Product>> {
    let id = ProductId::new(path.into_inner());
    let draft = ProductDraft::try_from(payload.into_inner())?;
    let product = state
        .bounded(state.catalogue.update_product(id, draft))
        .await?;
    Ok(web::Json(product))
}

/// Remove a product.
///
/// Products still referenced by carts or purchases need `force=true`.
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = i64, Path, description = "Product id"), DeleteQuery),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 303, description = "Administrator login required"),
        (status = 404, description = "No such product", body = ErrorSchema),
        (status = 409, description = "Product is referenced", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "deleteProduct"
)]
#[delete("/products/{id}", wrap = "RequireRoles::admin()")]
pub async fn delete_product(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    query: web::Query<DeleteQuery>,
) -> ApiResult<HttpResponse> {
    let id = ProductId::new(path.into_inner());
    let force = query.force.unwrap_or(false);
    state
        .bounded(state.catalogue.delete_product(id, force))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Add or remove stock. Decreases below zero are refused, not clamped.
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/stock",
    params(("id" = i64, Path, description = "Product id")),
    request_body = StockRequest,
    responses(
        (status = 200, description = "Adjustment outcome", body = StockAdjustmentSchema),
        (status = 400, description = "Delta out of range", body = ErrorSchema),
        (status = 303, description = "Administrator login required"),
        (status = 404, description = "No such product", body = ErrorSchema)
    ),
    tags = ["products"],
    operation_id = "adjustStock"
)]
#[post("/products/{id}/stock", wrap = "RequireRoles::admin()")]
pub async fn adjust_stock(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<StockRequest>,
) -> ApiResult<web::Json<StockAdjustment>> {
    let id = ProductId::new(path.into_inner());
    let adjustment = state
        .bounded(state.catalogue.adjust_stock(id, payload.delta))
        .await?;
    Ok(web::Json(adjustment))
}

#[cfg(test)]
#[path = "products_tests.rs"]
mod tests;
