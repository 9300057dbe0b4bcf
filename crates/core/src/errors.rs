use thiserror::Error;

use crate::avatar::AvatarError;

pub const CUSTOMER_NOT_FOUND: &str = "Customer with given customer id not found";
pub const CUSTOMERS_BY_AGE_NOT_FOUND: &str = "Customers with given age not found";
pub const INVALID_ID_OR_AGE: &str = "Invalid ID or age.";
pub const INVALID_CUSTOMER_ID: &str = "Customer id cannot be null or empty";
pub const MISSING_REQUEST_BODY: &str = "Customer request body is required";
pub const UPSTREAM_FAILURE_PREFIX: &str = "Exception Occured - ";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("customer validation failed: {}", .0.join(" "))]
    Validation(Vec<String>),
    #[error("{0}")]
    MalformedIdentifier(String),
    #[error("invalid patch document: {0}")]
    InvalidPatch(String),
    #[error("{0}")]
    MissingRequest(String),
}

impl DomainError {
    /// Messages suitable for the caller, one per violated rule.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{0}")]
    NotFound(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
}

impl ApplicationError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Caller-facing messages. Upstream failures carry the historical
    /// `"Exception Occured - "` prefix.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Domain(error) => error.messages(),
            Self::NotFound(message) => vec![message.clone()],
            Self::Persistence(message) | Self::Integration(message) => {
                vec![format!("{UPSTREAM_FAILURE_PREFIX}{message}")]
            }
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Integration(_))
    }
}

impl From<AvatarError> for ApplicationError {
    fn from(value: AvatarError) -> Self {
        Self::Integration(value.to_string())
    }
}
