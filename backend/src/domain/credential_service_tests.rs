//! Tests for the credential service.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockUserRepository, StoredCredentials};
use crate::domain::{ErrorCode, Money, Multiplier, PasswordHash};

/// Reversible stand-in for bcrypt that counts comparisons against absent
/// hashes.
#[derive(Default)]
struct PrefixHasher {
    blind_comparisons: AtomicUsize,
}

#[async_trait]
impl PasswordHasher for PrefixHasher {
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHasherError> {
        Ok(PasswordHash::new(format!("hashed:{password}")))
    }

    async fn verify(
        &self,
        password: &str,
        stored: Option<&PasswordHash>,
    ) -> Result<bool, PasswordHasherError> {
        match stored {
            Some(hash) => Ok(hash.as_str() == format!("hashed:{password}")),
            None => {
                self.blind_comparisons.fetch_add(1, Ordering::SeqCst);
                Ok(false)
            }
        }
    }
}

#[fixture]
fn alice() -> User {
    User {
        id: UserId::new(1),
        username: Username::new("alice01").expect("valid username"),
        email: "alice@example.com".to_owned(),
        balance: Money::ZERO,
        multiplier: Multiplier::BASE,
    }
}

fn service(repo: MockUserRepository) -> CredentialService<MockUserRepository, PrefixHasher> {
    CredentialService::new(Arc::new(repo), Arc::new(PrefixHasher::default()))
}

#[rstest]
#[tokio::test]
async fn create_user_stores_hash_not_plaintext(alice: User) {
    let mut repo = MockUserRepository::new();
    let created = alice.clone();
    repo.expect_insert()
        .withf(|new_user| {
            new_user.password_hash.as_str() == "hashed:secret12"
                && new_user.email == "alice@example.com"
        })
        .times(1)
        .return_once(move |_| Ok(created));

    let id = service(repo)
        .create_user(&alice.username, " alice@example.com ", "secret12")
        .await
        .expect("user created");

    assert_eq!(id, alice.id);
}

#[rstest]
#[tokio::test]
async fn create_user_reports_taken_username_as_conflict(alice: User) {
    let mut repo = MockUserRepository::new();
    repo.expect_insert()
        .times(1)
        .return_once(|_| Err(UserRepositoryError::username_taken("alice01")));

    let error = service(repo)
        .create_user(&alice.username, "alice@example.com", "secret12")
        .await
        .expect_err("duplicate");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn verify_accepts_matching_password(alice: User) {
    let mut repo = MockUserRepository::new();
    repo.expect_find_credentials().times(1).return_once(move |_| {
        Ok(Some(StoredCredentials {
            user: alice,
            password_hash: PasswordHash::new("hashed:secret12"),
        }))
    });
    let credentials = LoginCredentials::try_from_parts("alice01", "secret12").expect("valid");

    let verified = service(repo)
        .verify_credentials(&credentials)
        .await
        .expect("verification runs");

    assert!(verified);
}

#[rstest]
#[tokio::test]
async fn verify_rejects_wrong_password(alice: User) {
    let mut repo = MockUserRepository::new();
    repo.expect_find_credentials().times(1).return_once(move |_| {
        Ok(Some(StoredCredentials {
            user: alice,
            password_hash: PasswordHash::new("hashed:secret12"),
        }))
    });
    let credentials = LoginCredentials::try_from_parts("alice01", "guess123").expect("valid");

    let verified = service(repo)
        .verify_credentials(&credentials)
        .await
        .expect("verification runs");

    assert!(!verified);
}

#[tokio::test]
async fn verify_unknown_user_still_compares() {
    let mut repo = MockUserRepository::new();
    repo.expect_find_credentials()
        .times(1)
        .return_once(|_| Ok(None));
    let hasher = Arc::new(PrefixHasher::default());
    let service = CredentialService::new(Arc::new(repo), Arc::clone(&hasher));
    let credentials = LoginCredentials::try_from_parts("nobody1", "secret12").expect("valid");

    let verified = service
        .verify_credentials(&credentials)
        .await
        .expect("verification runs");

    assert!(!verified);
    assert_eq!(hasher.blind_comparisons.load(Ordering::SeqCst), 1);
}

#[rstest]
#[tokio::test]
async fn update_password_rehashes(alice: User) {
    let mut repo = MockUserRepository::new();
    let found = alice.clone();
    repo.expect_find_by_username()
        .times(1)
        .return_once(move |_| Ok(Some(found)));
    repo.expect_update_password_hash()
        .withf(|id, hash| *id == UserId::new(1) && hash.as_str() == "hashed:newpass1")
        .times(1)
        .return_once(|_, _| Ok(true));

    service(repo)
        .update_password(&alice.username, "newpass1")
        .await
        .expect("password updated");
}

#[rstest]
#[tokio::test]
async fn update_email_for_unknown_user_is_not_found(alice: User) {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_username()
        .times(1)
        .return_once(|_| Ok(None));
    repo.expect_update_email().times(0);

    let error = service(repo)
        .update_email(&alice.username, "new@example.com")
        .await
        .expect_err("unknown user");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn delete_user_removes_account(alice: User) {
    let mut repo = MockUserRepository::new();
    let found = alice.clone();
    repo.expect_find_by_username()
        .times(1)
        .return_once(move |_| Ok(Some(found)));
    repo.expect_delete()
        .withf(|id| *id == UserId::new(1))
        .times(1)
        .return_once(|_| Ok(true));

    service(repo)
        .delete_user(&alice.username)
        .await
        .expect("account deleted");
}

#[rstest]
#[tokio::test]
async fn connection_failures_map_to_service_unavailable(alice: User) {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_username()
        .times(1)
        .return_once(|_| Err(UserRepositoryError::connection("pool exhausted")));

    let error = service(repo)
        .find_user(&alice.username)
        .await
        .expect_err("pool down");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}
