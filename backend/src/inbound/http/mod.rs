//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod access;
pub mod account;
pub mod cache_control;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod health;
pub mod products;
pub mod roles;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

/// Register every `/api/v1` handler on a scope.
///
/// Role checks are attached per route, so the order here only matters for
/// paths that share a prefix.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use storefront::inbound::http::configure_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(users::signup)
        .service(users::login)
        .service(users::logout)
        .service(users::leaderboard)
        .service(account::get_account)
        .service(account::update_account)
        .service(account::delete_account)
        .service(account::earn)
        .service(products::search_products)
        .service(products::create_product)
        .service(products::get_product)
        .service(products::update_product)
        .service(products::delete_product)
        .service(products::adjust_stock)
        .service(cart::get_cart)
        .service(cart::add_item)
        .service(cart::remove_item)
        .service(checkout::preview)
        .service(checkout::checkout)
        .service(checkout::purchases)
        .service(roles::list_roles)
        .service(roles::grant_role)
        .service(roles::revoke_role);
}
