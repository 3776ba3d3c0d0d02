//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler plus the health probes, the
//! domain wrapper schemas from [`crate::inbound::http::schemas`] and the
//! session cookie security scheme. Swagger UI serves it in debug builds and
//! `cargo run --bin openapi-dump` prints it for external tooling.

use crate::inbound::http::account::{AccountUpdateRequest, BalanceResponse, EarnRequest};
use crate::inbound::http::cart::{AddItemRequest, CartResponse, ReleasedResponse};
use crate::inbound::http::checkout::CheckoutRequest;
use crate::inbound::http::products::{ProductPageResponse, ProductRequest, StockRequest};
use crate::inbound::http::roles::RolesResponse;
use crate::inbound::http::schemas::{
    AccountDetailsSchema, AddToCartOutcomeSchema, CartLineSchema, CheckoutOutcomeSchema,
    CheckoutPreviewSchema, ErrorCodeSchema, ErrorSchema, LeaderboardEntrySchema, ProductSchema,
    PurchaseRecordSchema, PurchaseSummarySchema, StockAdjustmentSchema, UserSchema,
};
use crate::inbound::http::users::{LoginRequest, SignupRequest};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Encrypted identity cookie issued by POST /api/v1/login or /api/v1/signup.",
            ))),
        );
    }
}

/// OpenAPI document for the storefront API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Storefront API",
        description = "Session-authenticated catalogue, cart and checkout.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::signup,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::leaderboard,
        crate::inbound::http::account::get_account,
        crate::inbound::http::account::update_account,
        crate::inbound::http::account::delete_account,
        crate::inbound::http::account::earn,
        crate::inbound::http::products::search_products,
        crate::inbound::http::products::get_product,
        crate::inbound::http::products::create_product,
        crate::inbound::http::products::update_product,
        crate::inbound::http::products::delete_product,
        crate::inbound::http::products::adjust_stock,
        crate::inbound::http::cart::get_cart,
        crate::inbound::http::cart::add_item,
        crate::inbound::http::cart::remove_item,
        crate::inbound::http::checkout::preview,
        crate::inbound::http::checkout::checkout,
        crate::inbound::http::checkout::purchases,
        crate::inbound::http::roles::list_roles,
        crate::inbound::http::roles::grant_role,
        crate::inbound::http::roles::revoke_role,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        UserSchema,
        LeaderboardEntrySchema,
        ProductSchema,
        CartLineSchema,
        AddToCartOutcomeSchema,
        PurchaseRecordSchema,
        CheckoutOutcomeSchema,
        CheckoutPreviewSchema,
        PurchaseSummarySchema,
        AccountDetailsSchema,
        StockAdjustmentSchema,
        SignupRequest,
        LoginRequest,
        AccountUpdateRequest,
        EarnRequest,
        BalanceResponse,
        ProductRequest,
        ProductPageResponse,
        StockRequest,
        AddItemRequest,
        CartResponse,
        ReleasedResponse,
        CheckoutRequest,
        RolesResponse,
    )),
    tags(
        (name = "users", description = "Signup, login and the public leaderboard"),
        (name = "account", description = "The signed-in user's own account"),
        (name = "products", description = "Catalogue search and administration"),
        (name = "cart", description = "Stock reservations held in the cart"),
        (name = "checkout", description = "Payment from balance and purchase history"),
        (name = "roles", description = "Role administration"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
