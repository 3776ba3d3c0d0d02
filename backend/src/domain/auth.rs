//! Authentication primitives: login credentials and stored password hashes.
//!
//! Plaintext passwords only ever live in [`Zeroizing`] buffers so they are
//! wiped when dropped.

use std::fmt;

use zeroize::Zeroizing;

use super::{UserValidationError, Username};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or malformed.
    #[error("invalid username: {0}")]
    Username(#[from] UserValidationError),
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials used by the credential store.
///
/// # Examples
/// ```
/// use storefront::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("shopper1", "hunter22").unwrap();
/// assert_eq!(creds.username().as_str(), "shopper1");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: Username,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let username = Username::new(username)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username used for the lookup.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Encoded output of the adaptive password hash; never a plaintext password.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash read from storage or produced by a hasher.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded hash string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}
