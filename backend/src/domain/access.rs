//! Per-request access decisions.
//!
//! The gate is pure: given the caller's identity (if any) and the roles a
//! resource requires, it either admits the request or asks the adapter to
//! send the caller to the login page with a way back.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::{RoleSet, UserId, Username};

/// Path of the login page used for redirects.
pub const LOGIN_PATH: &str = "/login";

/// Authenticated caller with resolved roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Account key.
    pub user_id: UserId,
    /// Account name carried by the session cookie.
    pub username: Username,
    /// Roles currently granted.
    pub roles: RoleSet,
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Proceed, attaching the identity when the caller is signed in.
    Allow(Option<Identity>),
    /// Send the caller to the login page.
    RedirectToLogin {
        /// Path and query the caller originally asked for.
        return_url: String,
        /// Explanation shown on the login page, when the caller is signed in
        /// but lacks the required roles.
        message: Option<String>,
    },
}

impl AccessDecision {
    /// `Location` value for a login redirect, or `None` when allowed.
    #[must_use]
    pub fn login_location(&self) -> Option<String> {
        match self {
            Self::Allow(_) => None,
            Self::RedirectToLogin {
                return_url,
                message,
            } => {
                let mut query = form_urlencoded::Serializer::new(String::new());
                query.append_pair("returnUrl", return_url);
                if let Some(message) = message {
                    query.append_pair("message", message);
                }
                Some(format!("{LOGIN_PATH}?{}", query.finish()))
            }
        }
    }
}

/// Decide whether a caller may reach a resource requiring `required` roles.
///
/// - No roles required: everyone passes, identity attached when present.
/// - Roles required, anonymous caller: redirect to login, keeping the path.
/// - Roles required, signed-in caller: pass when any required role is held,
///   otherwise redirect with a message naming the required roles.
///
/// # Examples
/// ```
/// use storefront::domain::{evaluate_access, AccessDecision, RoleName, RoleSet};
///
/// let required: RoleSet = [RoleName::admin()].into_iter().collect();
/// let decision = evaluate_access(&required, None, "/api/v1/products");
/// assert_eq!(
///     decision.login_location().as_deref(),
///     Some("/login?returnUrl=%2Fapi%2Fv1%2Fproducts")
/// );
/// ```
#[must_use]
pub fn evaluate_access(
    required: &RoleSet,
    identity: Option<Identity>,
    requested: &str,
) -> AccessDecision {
    if required.is_empty() {
        return AccessDecision::Allow(identity);
    }
    match identity {
        Some(identity) if identity.roles.intersects(required) => {
            AccessDecision::Allow(Some(identity))
        }
        Some(_) => AccessDecision::RedirectToLogin {
            return_url: requested.to_owned(),
            message: Some(format!(
                "You need one of the following roles to access this page: {}",
                required.joined()
            )),
        },
        None => AccessDecision::RedirectToLogin {
            return_url: requested.to_owned(),
            message: None,
        },
    }
}

/// Restrict post-login redirects to same-origin relative paths.
///
/// Anything that is not a single-slash absolute path (e.g. `//evil.test`,
/// `https://evil.test`, `/\evil.test`) falls back to `/`.
#[must_use]
pub fn safe_return_url(candidate: Option<&str>) -> String {
    match candidate.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.chars().any(char::is_control) =>
        {
            path.to_owned()
        }
        _ => "/".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoleName;
    use rstest::{fixture, rstest};

    fn roles(names: &[&str]) -> RoleSet {
        names
            .iter()
            .map(|name| RoleName::new(name).expect("valid role"))
            .collect()
    }

    #[fixture]
    fn shopper() -> Identity {
        Identity {
            user_id: UserId::new(7),
            username: Username::new("shopper1").expect("valid"),
            roles: roles(&["user"]),
        }
    }

    #[rstest]
    fn open_resources_admit_anonymous_callers() {
        assert_eq!(
            evaluate_access(&RoleSet::new(), None, "/products"),
            AccessDecision::Allow(None)
        );
    }

    #[rstest]
    fn open_resources_attach_identity(shopper: Identity) {
        let decision = evaluate_access(&RoleSet::new(), Some(shopper.clone()), "/products");
        assert_eq!(decision, AccessDecision::Allow(Some(shopper)));
    }

    #[rstest]
    fn anonymous_callers_are_sent_to_login_with_return_path() {
        let decision = evaluate_access(&roles(&["user"]), None, "/cart?x=1");
        assert_eq!(
            decision.login_location().as_deref(),
            Some("/login?returnUrl=%2Fcart%3Fx%3D1")
        );
    }

    #[rstest]
    fn matching_role_is_admitted(shopper: Identity) {
        let decision = evaluate_access(&roles(&["user", "admin"]), Some(shopper), "/cart");
        assert!(matches!(decision, AccessDecision::Allow(Some(_))));
    }

    #[rstest]
    fn missing_role_redirects_with_message(shopper: Identity) {
        let decision = evaluate_access(&roles(&["admin"]), Some(shopper), "/admin");
        match decision {
            AccessDecision::RedirectToLogin {
                return_url,
                message,
            } => {
                assert_eq!(return_url, "/admin");
                assert!(message.expect("message").contains("admin"));
            }
            AccessDecision::Allow(_) => panic!("non-admin must be redirected"),
        }
    }

    #[rstest]
    #[case(Some("/cart"), "/cart")]
    #[case(Some("/products?page=2"), "/products?page=2")]
    #[case(Some("//evil.test"), "/")]
    #[case(Some("https://evil.test"), "/")]
    #[case(Some("/\\evil.test"), "/")]
    #[case(Some(""), "/")]
    #[case(None, "/")]
    fn return_urls_stay_on_site(#[case] candidate: Option<&str>, #[case] expected: &str) {
        assert_eq!(safe_return_url(candidate), expected);
    }
}
