//! Tests for the account service.

use std::sync::Arc;

use rstest::rstest;
use serde_json::json;
use zeroize::Zeroizing;

use super::*;
use crate::domain::forms::{FORM_REJECTION_HEADER, PASSWORD_TOO_SHORT};
use crate::domain::ports::{
    MockCheckoutLedger, MockCredentialStore, MockRoleStore, MockUserRepository,
};
use crate::domain::{Multiplier, RoleSet, UserId};

#[derive(Default)]
struct Ports {
    credentials: MockCredentialStore,
    roles: MockRoleStore,
    checkout: MockCheckoutLedger,
    users: MockUserRepository,
}

impl Ports {
    fn into_service(self) -> AccountService<MockUserRepository> {
        AccountService::new(
            Arc::new(self.credentials),
            Arc::new(self.roles),
            Arc::new(self.checkout),
            Arc::new(self.users),
        )
    }
}

fn shopper(multiplier: u32) -> User {
    User {
        id: UserId::new(5),
        username: Username::new("shopper1").expect("valid username"),
        email: "shopper@example.com".to_owned(),
        balance: Money::ZERO,
        multiplier: Multiplier::new(multiplier).expect("positive"),
    }
}

fn signup_form(username: &str, password: &str) -> SignupForm {
    SignupForm {
        username: username.to_owned(),
        email: "shopper@example.com".to_owned(),
        password: Zeroizing::new(password.to_owned()),
        confirm_password: Zeroizing::new(password.to_owned()),
    }
}

#[tokio::test]
async fn signup_creates_user_and_grants_user_role() {
    let mut ports = Ports::default();
    let mut lookups = 0;
    ports
        .credentials
        .expect_find_user()
        .times(2)
        .returning(move |_| {
            lookups += 1;
            Ok((lookups > 1).then(|| shopper(1)))
        });
    ports
        .credentials
        .expect_create_user()
        .withf(|username, email, password| {
            username.as_str() == "shopper1"
                && email == "shopper@example.com"
                && password == "secret12"
        })
        .times(1)
        .return_once(|_, _, _| Ok(UserId::new(5)));
    ports
        .roles
        .expect_grant_role()
        .withf(|user_id, role| *user_id == UserId::new(5) && *role == RoleName::user())
        .times(1)
        .return_once(|_, _| Ok(()));

    let user = ports
        .into_service()
        .signup(signup_form("shopper1", "secret12"))
        .await
        .expect("signup succeeds");

    assert_eq!(user.username.as_str(), "shopper1");
}

#[tokio::test]
async fn signup_reports_taken_username_as_form_message() {
    let mut ports = Ports::default();
    ports
        .credentials
        .expect_find_user()
        .times(1)
        .return_once(|_| Ok(Some(shopper(1))));
    ports.credentials.expect_create_user().times(0);

    let error = ports
        .into_service()
        .signup(signup_form("shopper1", "secret12"))
        .await
        .expect_err("taken");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.details(), Some(&json!({ "messages": [USERNAME_TAKEN] })));
}

#[tokio::test]
async fn signup_validation_skips_the_store() {
    let mut ports = Ports::default();
    ports.credentials.expect_find_user().times(0);

    let error = ports
        .into_service()
        .signup(signup_form("shopper1", "short"))
        .await
        .expect_err("invalid form");

    assert_eq!(error.message(), FORM_REJECTION_HEADER);
    assert_eq!(
        error.details(),
        Some(&json!({ "messages": [PASSWORD_TOO_SHORT] }))
    );
}

#[tokio::test]
async fn signup_rejects_usernames_with_spaces() {
    let ports = Ports::default();

    let error = ports
        .into_service()
        .signup(signup_form("shop per", "secret12"))
        .await
        .expect_err("invalid username");

    assert_eq!(
        error.details(),
        Some(&json!({ "messages": ["- username must not contain whitespace"] }))
    );
}

#[tokio::test]
async fn delete_account_removes_the_user_in_one_call() {
    let mut ports = Ports::default();
    ports
        .credentials
        .expect_find_user()
        .times(1)
        .return_once(|_| Ok(Some(shopper(1))));
    ports
        .credentials
        .expect_delete_user()
        .withf(|username| username.as_str() == "shopper1")
        .times(1)
        .return_once(|_| Ok(()));

    ports
        .into_service()
        .delete_account(&shopper(1).username)
        .await
        .expect("account deleted");
}

#[tokio::test]
async fn failed_delete_touches_nothing_else() {
    let mut ports = Ports::default();
    ports
        .credentials
        .expect_find_user()
        .times(1)
        .return_once(|_| Ok(Some(shopper(1))));
    ports
        .credentials
        .expect_delete_user()
        .times(1)
        .return_once(|_| Err(Error::service_unavailable("database offline")));
    ports.roles.expect_revoke_role().times(0);
    ports.checkout.expect_checkout().times(0);

    let error = ports
        .into_service()
        .delete_account(&shopper(1).username)
        .await
        .expect_err("store failure propagates");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn update_account_applies_only_supplied_fields() {
    let mut ports = Ports::default();
    ports
        .credentials
        .expect_find_user()
        .times(1)
        .return_once(|_| Ok(Some(shopper(1))));
    ports
        .credentials
        .expect_update_email()
        .withf(|_, email| email == "new@example.com")
        .times(1)
        .return_once(|_, _| Ok(()));
    ports.credentials.expect_update_password().times(0);

    let form = AccountUpdateForm {
        email: Some("new@example.com".to_owned()),
        ..AccountUpdateForm::default()
    };
    ports
        .into_service()
        .update_account(&shopper(1).username, form)
        .await
        .expect("account updated");
}

#[tokio::test]
async fn account_details_collects_roles_and_purchases() {
    let mut ports = Ports::default();
    ports
        .credentials
        .expect_find_user()
        .times(1)
        .return_once(|_| Ok(Some(shopper(1))));
    ports
        .roles
        .expect_list_roles()
        .times(1)
        .return_once(|_| Ok([RoleName::user()].into_iter().collect::<RoleSet>()));
    ports
        .checkout
        .expect_purchase_history()
        .times(1)
        .return_once(|_| Ok(Vec::new()));

    let details = ports
        .into_service()
        .account_details(&shopper(1).username)
        .await
        .expect("details");

    assert!(details.roles.contains(&RoleName::user()));
    assert!(details.purchases.is_empty());
}

#[rstest]
#[case(Some(0))]
#[case(Some(101))]
#[tokio::test]
async fn leaderboard_limit_is_bounded(#[case] limit: Option<u32>) {
    let mut ports = Ports::default();
    ports.users.expect_top_by_balance().times(0);

    let error = ports
        .into_service()
        .leaderboard(limit)
        .await
        .expect_err("out of range");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn leaderboard_defaults_to_ten() {
    let mut ports = Ports::default();
    ports
        .users
        .expect_top_by_balance()
        .withf(|limit| *limit == DEFAULT_LEADERBOARD_LIMIT)
        .times(1)
        .return_once(|_| Ok(Vec::new()));

    let entries = ports
        .into_service()
        .leaderboard(None)
        .await
        .expect("leaderboard");

    assert!(entries.is_empty());
}

#[tokio::test]
async fn earn_scales_clicks_by_multiplier() {
    let mut ports = Ports::default();
    ports
        .credentials
        .expect_find_user()
        .times(1)
        .return_once(|_| Ok(Some(shopper(3))));
    ports
        .users
        .expect_credit_balance()
        .withf(|_, amount| amount.cents() == 1_200)
        .times(1)
        .return_once(|_, amount| Ok(Some(amount)));

    let balance = ports
        .into_service()
        .earn(&shopper(3).username, 4)
        .await
        .expect("credited");

    assert_eq!(balance.to_string(), "12.00");
}

#[rstest]
#[case(0)]
#[case(101)]
#[tokio::test]
async fn earn_rejects_out_of_range_clicks(#[case] clicks: u32) {
    let ports = Ports::default();

    let error = ports
        .into_service()
        .earn(&shopper(1).username, clicks)
        .await
        .expect_err("out of range");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}
