//! API error type and [`axum::response::IntoResponse`] implementation.

use std::time::Duration;

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use expediente_core::{
  lookup::LookupError,
  persistence::PersistenceError,
  session::ValidationErrors,
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Required fields are missing; nothing was written.
  #[error("{0}")]
  Validation(ValidationErrors),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("storage call timed out after {0:?}")]
  Timeout(Duration),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<LookupError> for ApiError {
  fn from(e: LookupError) -> Self {
    match e {
      LookupError::NotFound(id) => ApiError::NotFound(format!("subject {id} not found")),
      LookupError::TimedOut(d) => ApiError::Timeout(d),
      LookupError::Storage(e) => ApiError::Store(e),
    }
  }
}

impl From<PersistenceError> for ApiError {
  fn from(e: PersistenceError) -> Self {
    match e {
      PersistenceError::SubjectNotFound(id) => {
        ApiError::NotFound(format!("subject {id} not found"))
      }
      e @ PersistenceError::AttentionTypeUnavailable(_) => ApiError::Conflict(e.to_string()),
      PersistenceError::TimedOut(d) => ApiError::Timeout(d),
      PersistenceError::Storage(e) => ApiError::Store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = match &self {
      ApiError::Validation(errors) => json!({ "error": self.to_string(), "fields": errors.0 }),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        json!({ "error": self.to_string() })
      }
      _ => json!({ "error": self.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}
