//! Request body extraction helpers shared by the JSON endpoints.

use axum::extract::{FromRequest, FromRequestParts};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, calendar::parse_date};

/// JSON request body extractor that reports malformed bodies as [Error::InvalidRequestBody].
///
/// Use this instead of [axum::Json] in handlers so that clients always get a
/// JSON error message in the same shape as every other error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor that reports malformed parameters as [Error::NotFound].
///
/// An ID that is not even a number cannot refer to a stored record.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// A number that may arrive either as a JSON number or as a numeric string.
///
/// Browser form inputs produce strings, so clients frequently send `"12.50"`
/// where a number is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    /// A JSON number.
    Number(f64),
    /// A JSON string that should contain a number.
    Text(String),
}

impl LooseNumber {
    /// The numeric value, or `None` if the string does not parse as a finite number.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            LooseNumber::Number(number) => *number,
            LooseNumber::Text(text) => text.trim().parse().ok()?,
        };

        value.is_finite().then_some(value)
    }
}

impl From<f64> for LooseNumber {
    fn from(value: f64) -> Self {
        LooseNumber::Number(value)
    }
}

/// Trim `text` and return it if anything is left.
pub fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// The validated fields that expenses and income have in common.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFields {
    /// The expense category or income source.
    pub label: String,
    /// A positive amount of money.
    pub amount: f64,
    /// When the money was spent or earned.
    pub date: Date,
    /// An optional icon chosen by the client, e.g. an emoji or an image URL.
    pub icon: Option<String>,
}

/// The message for transactions missing their label, amount or date.
pub const MISSING_TRANSACTION_FIELDS: &str = "All fields are required";

/// Validate the raw fields of an expense or income request.
///
/// # Errors
///
/// Returns a:
/// - [Error::MissingFields] if the label, amount or date is missing or blank,
/// - [Error::InvalidAmount] if the amount is not a positive number,
/// - [Error::InvalidDate] if the date cannot be parsed.
pub fn parse_transaction_fields(
    label: Option<String>,
    amount: Option<LooseNumber>,
    date: Option<String>,
    icon: Option<String>,
) -> Result<TransactionFields, Error> {
    let amount = amount.filter(|amount| match amount {
        LooseNumber::Number(_) => true,
        LooseNumber::Text(text) => !text.trim().is_empty(),
    });

    let (Some(label), Some(amount), Some(date)) = (non_blank(label), amount, non_blank(date))
    else {
        return Err(Error::MissingFields(MISSING_TRANSACTION_FIELDS));
    };

    let amount = amount
        .value()
        .filter(|amount| *amount > 0.0)
        .ok_or(Error::InvalidAmount)?;

    Ok(TransactionFields {
        label,
        amount,
        date: parse_date(&date)?,
        icon: non_blank(icon),
    })
}
