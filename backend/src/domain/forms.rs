//! Account forms whose violations are reported all at once.
//!
//! Signup and account edits collect every human-readable problem instead of
//! stopping at the first one, so a form can be shown back with the full list.

use serde_json::json;
use zeroize::Zeroizing;

use super::Error;

/// Header line placed before the individual violations.
pub const FORM_REJECTION_HEADER: &str = "Fill in all fields correctly:";
/// Username too short.
pub const USERNAME_TOO_SHORT: &str = "- Username should be longer than 5 characters";
/// Email missing or too short.
pub const INVALID_EMAIL: &str = "- An invalid email was provided";
/// Password too short.
pub const PASSWORD_TOO_SHORT: &str = "- Password should be longer than 5 characters";
/// Password and confirmation differ.
pub const PASSWORDS_DIFFER: &str = "- The passwords given are different";
/// Username already registered.
pub const USERNAME_TAKEN: &str = "- Username is already taken, please choose a different one";

const MIN_FIELD_CHARS: usize = 5;

fn longer_than_minimum(value: &str) -> bool {
    value.chars().count() > MIN_FIELD_CHARS
}

/// Rejected form with every violation found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRejection {
    messages: Vec<String>,
}

impl FormRejection {
    /// Wrap the collected messages.
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    /// Individual violation messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl From<FormRejection> for Error {
    fn from(value: FormRejection) -> Self {
        Error::invalid_request(FORM_REJECTION_HEADER)
            .with_details(json!({ "messages": value.messages }))
    }
}

/// Raw signup input.
#[derive(Clone, Default)]
pub struct SignupForm {
    /// Requested username.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Chosen password.
    pub password: Zeroizing<String>,
    /// Password confirmation.
    pub confirm_password: Zeroizing<String>,
}

impl SignupForm {
    /// Field-level violations, excluding the username availability check
    /// which needs the credential store.
    pub fn violations(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if !longer_than_minimum(self.username.trim()) {
            messages.push(USERNAME_TOO_SHORT.to_owned());
        }
        if !longer_than_minimum(self.email.trim()) {
            messages.push(INVALID_EMAIL.to_owned());
        }
        if !longer_than_minimum(&self.password) {
            messages.push(PASSWORD_TOO_SHORT.to_owned());
        }
        if *self.password != *self.confirm_password {
            messages.push(PASSWORDS_DIFFER.to_owned());
        }
        messages
    }
}

/// Raw account edit input; blank fields are left unchanged.
#[derive(Clone, Default)]
pub struct AccountUpdateForm {
    /// Replacement email.
    pub email: Option<String>,
    /// Replacement password.
    pub password: Option<Zeroizing<String>>,
    /// Confirmation of the replacement password.
    pub confirm_password: Option<Zeroizing<String>>,
}

/// Changes extracted from a valid [`AccountUpdateForm`].
#[derive(Clone, Default)]
pub struct AccountChanges {
    /// New email, when supplied.
    pub email: Option<String>,
    /// New plaintext password, when supplied.
    pub password: Option<Zeroizing<String>>,
}

impl AccountUpdateForm {
    /// Validate the edit, returning the changes to apply.
    pub fn validate(self) -> Result<AccountChanges, FormRejection> {
        let email = self
            .email
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let password = self.password.filter(|value| !value.is_empty());
        let confirm = self.confirm_password.filter(|value| !value.is_empty());

        let mut messages = Vec::new();
        if email.as_deref().is_some_and(|value| !longer_than_minimum(value)) {
            messages.push(INVALID_EMAIL.to_owned());
        }
        if (password.is_some() || confirm.is_some())
            && !password.as_deref().is_some_and(|value| longer_than_minimum(value))
        {
            messages.push(PASSWORD_TOO_SHORT.to_owned());
        }
        if password.as_deref().map(String::as_str) != confirm.as_deref().map(String::as_str) {
            messages.push(PASSWORDS_DIFFER.to_owned());
        }
        if !messages.is_empty() {
            return Err(FormRejection::new(messages));
        }
        Ok(AccountChanges { email, password })
    }
}
