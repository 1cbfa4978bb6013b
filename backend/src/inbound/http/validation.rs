//! Shared validation helpers for inbound HTTP adapters.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use crate::domain::{Amount, Error};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidDate,
    InvalidAmount,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidDate => "invalid_date",
            Self::InvalidAmount => "invalid_amount",
        }
    }
}

/// HTTP field name as the client spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, message: String, code: ErrorCode, value: Option<&str>) -> Error {
    let mut details = json!({
        "field": field.as_str(),
        "code": code.as_str(),
    });
    if let (Some(value), Some(map)) = (value, details.as_object_mut()) {
        map.insert("value".to_owned(), json!(value));
    }
    Error::invalid_request(message).with_details(details)
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(
        field,
        format!("missing required field: {}", field.as_str()),
        ErrorCode::MissingField,
        None,
    )
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    field_error(
        field,
        format!("{} must be a valid UUID", field.as_str()),
        ErrorCode::InvalidUuid,
        Some(value),
    )
}

/// Parse any ledger identifier (`UserId`, `AdvanceId`, ...) from request
/// text.
pub(crate) fn parse_id<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: std::str::FromStr,
{
    value
        .parse::<T>()
        .map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_optional_id<T>(value: Option<&str>, field: FieldName) -> Result<Option<T>, Error>
where
    T: std::str::FromStr,
{
    value.map(|raw| parse_id(raw, field)).transpose()
}

pub(crate) fn parse_optional_date(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<NaiveDate>, Error> {
    value
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                field_error(
                    field,
                    format!("{} must be a YYYY-MM-DD date", field.as_str()),
                    ErrorCode::InvalidDate,
                    Some(raw),
                )
            })
        })
        .transpose()
}

/// Parse a non-negative money amount with at most two decimal places.
pub(crate) fn parse_amount(value: &str, field: FieldName) -> Result<Amount, Error> {
    let invalid = |reason: String| {
        field_error(
            field,
            format!("{} {reason}", field.as_str()),
            ErrorCode::InvalidAmount,
            Some(value),
        )
    };
    let decimal =
        Decimal::from_str(value.trim()).map_err(|_| invalid("must be a decimal number".to_owned()))?;
    Amount::new(decimal).map_err(|err| invalid(err.to_string()))
}
