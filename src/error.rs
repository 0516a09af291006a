//! Error type shared by the store, core logic and HTTP handlers.
//!
//! Every failure is rendered as `{"error": "..."}`; server-side failures also
//! carry `details` with the underlying error string.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  Forbidden(String),
  #[error("{0}")]
  InvalidRequest(String),
  #[error("{0}")]
  Conflict(String),
  #[error("storage I/O failed: {0}")]
  Storage(#[from] std::io::Error),
  #[error("snapshot encoding failed: {0}")]
  Snapshot(#[from] serde_json::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
  pub fn not_found(msg: impl Into<String>) -> Self { Self::NotFound(msg.into()) }
  pub fn forbidden(msg: impl Into<String>) -> Self { Self::Forbidden(msg.into()) }
  pub fn invalid(msg: impl Into<String>) -> Self { Self::InvalidRequest(msg.into()) }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Storage(_) | Self::Snapshot(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = if status.is_server_error() {
      error!(target: "learnpath", error = %self, "Request failed");
      json!({ "error": "Server error", "details": self.to_string() })
    } else {
      warn!(target: "learnpath", %status, error = %self, "Request rejected");
      json!({ "error": self.to_string() })
    };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn client_errors_map_to_4xx() {
    assert_eq!(ApiError::not_found("Lesson not found").status(), StatusCode::NOT_FOUND);
    assert_eq!(ApiError::forbidden("nope").status(), StatusCode::FORBIDDEN);
    assert_eq!(ApiError::invalid("bad").status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::Conflict("dup".into()).status(), StatusCode::CONFLICT);
  }

  #[test]
  fn io_failures_are_server_errors() {
    let err: ApiError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(err.to_string().contains("disk full"));
  }
}
