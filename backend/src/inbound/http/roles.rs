//! Role administration handlers.
//!
//! ```text
//! GET    /api/v1/users/{username}/roles
//! PUT    /api/v1/users/{username}/roles/{role}
//! DELETE /api/v1/users/{username}/roles/{role}
//! ```

use actix_web::{delete, get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, RoleSet, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::access::RequireRoles;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_role_name, parse_username};

/// Roles held by an account.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RolesResponse {
    pub username: String,
    #[schema(value_type = Vec<String>, example = json!(["user"]))]
    pub roles: RoleSet,
}

async fn require_user(state: &HttpState, raw: &str) -> Result<User, Error> {
    let username = parse_username(raw, FieldName::new("username"))?;
    state
        .bounded(state.credentials.find_user(&username))
        .await?
        .ok_or_else(|| Error::not_found(format!("user {username} not found")))
}

async fn roles_of(state: &HttpState, user: User) -> Result<RolesResponse, Error> {
    let roles = state.bounded(state.roles.list_roles(user.id)).await?;
    Ok(RolesResponse {
        username: user.username.as_str().to_owned(),
        roles,
    })
}

/// List an account's roles.
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}/roles",
    params(("username" = String, Path, description = "Account name")),
    responses(
        (status = 200, description = "Roles held", body = RolesResponse),
        (status = 303, description = "Administrator login required"),
        (status = 404, description = "No such user", body = ErrorSchema)
    ),
    tags = ["roles"],
    operation_id = "listRoles"
)]
#[get("/users/{username}/roles", wrap = "RequireRoles::admin()")]
pub async fn list_roles(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<RolesResponse>> {
    let user = require_user(&state, &path).await?;
    Ok(web::Json(roles_of(&state, user).await?))
}

/// Grant a role. Granting a role already held changes nothing.
#[utoipa::path(
    put,
    path = "/api/v1/users/{username}/roles/{role}",
    params(
        ("username" = String, Path, description = "Account name"),
        ("role" = String, Path, description = "Role name")
    ),
    responses(
        (status = 200, description = "Roles after the grant", body = RolesResponse),
        (status = 303, description = "Administrator login required"),
        (status = 404, description = "No such user or role", body = ErrorSchema)
    ),
    tags = ["roles"],
    operation_id = "grantRole"
)]
#[put("/users/{username}/roles/{role}", wrap = "RequireRoles::admin()")]
pub async fn grant_role(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<RolesResponse>> {
    let (username, role) = path.into_inner();
    let role = parse_role_name(&role, FieldName::new("role"))?;
    let user = require_user(&state, &username).await?;
    state.bounded(state.roles.grant_role(user.id, &role)).await?;
    Ok(web::Json(roles_of(&state, user).await?))
}

/// Revoke a role. Revoking a role not held changes nothing.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{username}/roles/{role}",
    params(
        ("username" = String, Path, description = "Account name"),
        ("role" = String, Path, description = "Role name")
    ),
    responses(
        (status = 200, description = "Roles after the revocation", body = RolesResponse),
        (status = 303, description = "Administrator login required"),
        (status = 404, description = "No such user", body = ErrorSchema)
    ),
    tags = ["roles"],
    operation_id = "revokeRole"
)]
#[delete("/users/{username}/roles/{role}", wrap = "RequireRoles::admin()")]
pub async fn revoke_role(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<RolesResponse>> {
    let (username, role) = path.into_inner();
    let role = parse_role_name(&role, FieldName::new("role"))?;
    let user = require_user(&state, &username).await?;
    state.bounded(state.roles.revoke_role(user.id, &role)).await?;
    Ok(web::Json(roles_of(&state, user).await?))
}
