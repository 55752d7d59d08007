// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for the relay API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayError {
    /// The connection registry has not been installed yet.
    NotReady,
    BadRequest,
    Internal,
}

impl RelayError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotReady => "NOT_READY",
            Self::BadRequest => "BAD_REQUEST",
            Self::Internal => "INTERNAL",
        }
    }

    /// Message used when a handler has nothing more specific to say.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::NotReady => "relay not ready",
            Self::BadRequest => "malformed trigger request",
            Self::Internal => "relay failed",
        }
    }

    /// Attach a caller-facing message.
    pub fn with_message(self, message: impl Into<String>) -> ApiError {
        ApiError { code: self, message: message.into() }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.as_str(), self.default_message())
    }
}

impl std::error::Error for RelayError {}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// A relay error on its way back to an HTTP caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: RelayError,
    pub message: String,
}

impl From<RelayError> for ApiError {
    fn from(code: RelayError) -> Self {
        code.with_message(code.default_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody { code: self.code.as_str().to_owned(), message: self.message },
        };
        (self.code.http_status(), Json(body)).into_response()
    }
}

/// JSON error envelope: `{"error": {"code", "message"}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
