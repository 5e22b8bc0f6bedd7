//! Monetary input and output at the HTTP boundary.
//!
//! Requests may carry amounts as JSON numbers or numeric strings; both are
//! parsed into `Decimal`. Responses expose money as `f64`, and only there.

use crate::errors::ServiceError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest number of decimal places accepted for any amount
pub const MAX_INPUT_SCALE: u32 = 2;

/// An amount as the client sent it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl RawAmount {
    /// Parses the amount, naming `field` in the error when it is malformed
    pub fn parse(&self, field: &str) -> Result<Decimal, ServiceError> {
        let text = match self {
            RawAmount::Number(n) => n.to_string(),
            RawAmount::Text(s) => s.trim().to_string(),
        };
        parse_decimal(&text).ok_or_else(|| {
            ServiceError::BadRequest(format!("Invalid amount for field '{}'", field))
        })
    }
}

impl From<Decimal> for RawAmount {
    fn from(value: Decimal) -> Self {
        RawAmount::Text(value.to_string())
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    let value = Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()?;
    (value.normalize().scale() <= MAX_INPUT_SCALE).then_some(value)
}

/// Parses a required amount: missing is a 400 as well
pub fn required_amount(raw: Option<&RawAmount>, field: &str) -> Result<Decimal, ServiceError> {
    match raw {
        Some(raw) => raw.parse(field),
        None => Err(ServiceError::BadRequest(format!("Missing {}", field))),
    }
}

/// Parses an amount that must not be negative
pub fn non_negative_amount(raw: &RawAmount, field: &str) -> Result<Decimal, ServiceError> {
    let value = raw.parse(field)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(value)
}

/// Boundary conversion for response DTOs
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
