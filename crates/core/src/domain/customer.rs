use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CustomerId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// A persisted customer record.
///
/// `name` and `date_of_birth` are only ever produced by the validator, so a
/// stored record always satisfies the input rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "customerId")]
    pub id: CustomerId,
    #[serde(rename = "customerName")]
    pub name: String,
    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: NaiveDate,
    /// Base64 of the sanitized SVG avatar; empty until the first fetch.
    #[serde(rename = "profileImage", default)]
    pub profile_image: String,
}

impl Customer {
    /// Projects the record back into the raw request shape that patch
    /// documents operate on.
    pub fn to_request(&self) -> CustomerRequest {
        CustomerRequest {
            customer_name: self.name.clone(),
            date_of_birth: self.date_of_birth.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        completed_years(self.date_of_birth, today)
    }
}

/// Raw, unvalidated input for create and update.
///
/// Any JSON value is accepted for either field so that the validator, not
/// the deserializer, decides what is wrong with it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRequest {
    #[serde(rename = "customerName", default, deserialize_with = "lenient_string")]
    pub customer_name: String,
    #[serde(rename = "dateOfBirth", default, deserialize_with = "lenient_string")]
    pub date_of_birth: String,
}

/// `null` becomes empty; numbers and other scalars keep their JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(value) => value,
        other => other.to_string(),
    })
}

pub fn completed_years(date_of_birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if date_of_birth > today {
        return None;
    }
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Inclusive range of birth dates for which a person is exactly `age`
/// completed years old on `today`. `None` when the range falls outside the
/// calendar `chrono` can represent.
pub fn birth_date_range_for_age(age: u32, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let latest = today.checked_sub_months(Months::new(age.checked_mul(12)?))?;
    let before_earliest =
        today.checked_sub_months(Months::new(age.checked_add(1)?.checked_mul(12)?))?;
    let earliest = before_earliest.checked_add_days(Days::new(1))?;
    Some((earliest, latest))
}
