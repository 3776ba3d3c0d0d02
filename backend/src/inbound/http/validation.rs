//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper reports `invalid_request` with `details.field` and
//! `details.code`, so clients can point at the offending input.

use serde_json::json;

use crate::domain::{Error, Money, RoleName, Username};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUsername,
    InvalidRole,
    InvalidAmount,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUsername => "invalid_username",
            ErrorCode::InvalidRole => "invalid_role",
            ErrorCode::InvalidAmount => "invalid_amount",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

fn field_error(field: FieldName, message: impl Into<String>, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn field_value_error(
    field: FieldName,
    message: impl Into<String>,
    code: ErrorCode,
    value: &str,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        format!("missing required field: {name}"),
        ErrorCode::MissingField,
    )
}

pub(crate) fn parse_username(value: &str, field: FieldName) -> Result<Username, Error> {
    Username::new(value).map_err(|err| {
        field_value_error(field, err.to_string(), ErrorCode::InvalidUsername, value)
    })
}

pub(crate) fn parse_role_name(value: &str, field: FieldName) -> Result<RoleName, Error> {
    RoleName::new(value)
        .map_err(|err| field_value_error(field, err.to_string(), ErrorCode::InvalidRole, value))
}

pub(crate) fn parse_money(value: &str, field: FieldName) -> Result<Money, Error> {
    value.parse::<Money>().map_err(|err| {
        field_value_error(
            field,
            format!("{}: {err}", field.as_str()),
            ErrorCode::InvalidAmount,
            value,
        )
    })
}

pub(crate) fn parse_optional_money(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<Money>, Error> {
    value
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_money(raw, field))
        .transpose()
}
