//! Input rules for customer create and update requests.
//!
//! Every rule is evaluated so that a single response can report all of the
//! problems with a request at once.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use super::customer::CustomerRequest;
use crate::errors::DomainError;

pub const INVALID_NAME: &str = "Customer Name cannot have special characters, numbers, leading and trailing spaces and allows one blank space between words.";
pub const EMPTY_DATE_OF_BIRTH: &str =
    "Customer Date of Birth cannot be null or empty. Please use ISO8601 date format only.";
pub const INVALID_DATE_FORMAT: &str = "Invalid Date Format. Please use ISO8601 date format only.";
pub const FUTURE_DATE_OF_BIRTH: &str = "Date of Birth cannot be a future date.";

static CUSTOMER_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn customer_name_regex() -> &'static Regex {
    CUSTOMER_NAME_RE.get_or_init(|| {
        Regex::new(r"^\p{L}+(?: \p{L}+)*$")
            .unwrap_or_else(|error| panic!("customer name regex failed to compile: {error}"))
    })
}

/// Name and date of birth that passed every rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidCustomerFields {
    pub name: String,
    pub date_of_birth: NaiveDate,
}

pub fn validate_name(name: &str) -> Option<&'static str> {
    (!customer_name_regex().is_match(name)).then_some(INVALID_NAME)
}

/// Checks the raw date-of-birth string. The three failure modes are mutually
/// exclusive: empty, unparseable, or not strictly before `today`.
pub fn validate_date_of_birth(raw: &str, today: NaiveDate) -> Result<NaiveDate, &'static str> {
    if raw.trim().is_empty() {
        return Err(EMPTY_DATE_OF_BIRTH);
    }
    let date = parse_iso_date(raw).ok_or(INVALID_DATE_FORMAT)?;
    if date >= today {
        return Err(FUTURE_DATE_OF_BIRTH);
    }
    Ok(date)
}

pub fn validate_request(
    request: &CustomerRequest,
    today: NaiveDate,
) -> Result<ValidCustomerFields, DomainError> {
    let mut errors = Vec::new();

    if let Some(message) = validate_name(&request.customer_name) {
        errors.push(message.to_string());
    }

    let date_of_birth = match validate_date_of_birth(&request.date_of_birth, today) {
        Ok(date) => Some(date),
        Err(message) => {
            errors.push(message.to_string());
            None
        }
    };

    match date_of_birth {
        Some(date_of_birth) if errors.is_empty() => {
            Ok(ValidCustomerFields { name: request.customer_name.clone(), date_of_birth })
        }
        _ => Err(DomainError::Validation(errors)),
    }
}

/// Accepts calendar dates (`1981-09-09`) and ISO-8601 date-times, keeping
/// only the date part.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|dt| dt.date())
        })
}
