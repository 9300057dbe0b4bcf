use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clientele_core::errors::{ApplicationError, DomainError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Uniform wrapper around every customer API response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub is_success: bool,
    pub error_messages: Vec<String>,
    pub result: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(result: T) -> Self {
        Self::success(StatusCode::OK, Some(result))
    }

    pub fn created(result: T) -> Self {
        Self::success(StatusCode::CREATED, Some(result))
    }

    pub fn no_content() -> Self {
        Self::success(StatusCode::NO_CONTENT, None)
    }

    pub fn success(status: StatusCode, result: Option<T>) -> Self {
        Self { status_code: status.as_u16(), is_success: true, error_messages: Vec::new(), result }
    }

    pub fn failure(status: StatusCode, error_messages: Vec<String>) -> Self {
        Self { status_code: status.as_u16(), is_success: false, error_messages, result: None }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

pub fn status_for(error: &ApplicationError) -> StatusCode {
    match error {
        ApplicationError::Domain(_) => StatusCode::BAD_REQUEST,
        ApplicationError::NotFound(_) => StatusCode::NOT_FOUND,
        ApplicationError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ApplicationError::Integration(_) => StatusCode::BAD_GATEWAY,
    }
}

impl<T> From<ApplicationError> for ApiResponse<T> {
    fn from(value: ApplicationError) -> Self {
        let status = status_for(&value);
        match &value {
            ApplicationError::Domain(DomainError::Validation(messages)) => warn!(
                event_name = "customer.request.rejected",
                status = status.as_u16(),
                violations = messages.len(),
                "customer request failed validation"
            ),
            ApplicationError::Domain(_) | ApplicationError::NotFound(_) => warn!(
                event_name = "customer.request.rejected",
                status = status.as_u16(),
                error = %value,
                "customer request rejected"
            ),
            ApplicationError::Persistence(_) | ApplicationError::Integration(_) => error!(
                event_name = "customer.request.failed",
                status = status.as_u16(),
                error = %value,
                "customer request failed upstream"
            ),
        }

        Self::failure(status, value.messages())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }
        (status, Json(self)).into_response()
    }
}
