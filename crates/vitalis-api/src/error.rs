//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every handler error renders as `{ statusCode, error, message }`. Internal
//! failures are logged and replaced with a generic message so nothing about
//! the storage layer leaks onto the wire.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use vitalis_core::Error as CoreError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),

  /// Payload validation failures; the message renders as a list.
  #[error("validation failed")]
  Validation(Vec<String>),

  /// Uniform for every credential failure, so callers cannot probe which
  /// emails exist or which accounts are deactivated.
  #[error("invalid credentials")]
  Unauthorized,

  #[error("insufficient permission to access this resource")]
  Forbidden,

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("internal error")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) | ApiError::Validation(_) => {
        StatusCode::BAD_REQUEST
      }
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::Validation(violations) => json!(violations),
      ApiError::Internal(source) => {
        tracing::error!(error = %source, "internal error");
        json!("internal server error")
      }
      other => json!(other.to_string()),
    };
    let body = json!({
      "statusCode": status.as_u16(),
      "error": status.canonical_reason().unwrap_or("error"),
      "message": message,
    });
    (status, Json(body)).into_response()
  }
}

/// Map the domain taxonomy onto HTTP statuses.
impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self {
    match err {
      CoreError::EmailTaken(_)
      | CoreError::CpfTaken(_)
      | CoreError::ProfessionalNameTaken(_)
      | CoreError::UnitCodeTaken(_) => ApiError::Conflict(err.to_string()),

      CoreError::UserNotFound(_)
      | CoreError::ProfileNotFound(..)
      | CoreError::UnitNotFound(_)
      | CoreError::PatientNotFound(_)
      | CoreError::MedicNotFound(_)
      | CoreError::ProfessionalsNotFound(_)
      | CoreError::AppointmentNotFound(_) => ApiError::NotFound(err.to_string()),

      CoreError::PasswordMismatch
      | CoreError::UnknownRole(_)
      | CoreError::UnknownVariant(..) => ApiError::BadRequest(err.to_string()),

      CoreError::Hash(_) | CoreError::Backend(_) => {
        ApiError::Internal(Box::new(err))
      }
    }
  }
}

/// Funnel a store error through the domain taxonomy.
pub(crate) fn store_err<E: Into<CoreError>>(err: E) -> ApiError {
  ApiError::from(err.into())
}
