// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::envelope::{Envelope, CODE_BUSINESS_ERROR};

/// Request-scoped error text attached to a response for the access log.
///
/// Never serialized to the caller.
#[derive(Debug, Clone)]
pub struct ErrorNote(pub String);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request could not be read at the transport level
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    /// Missing, invalid, expired or wrong-type token
    #[error("unauthenticated")]
    Unauthenticated,
    /// Authenticated but not privileged enough, or no role context
    #[error("forbidden")]
    Forbidden,
    #[error("rate limited")]
    RateLimited,
    /// Failure behind the gates, reported with HTTP 200
    #[error("{0}")]
    Business(String),
    /// Anything unexpected; detail stays server-side
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn business(message: impl Into<String>) -> Self {
        Self::Business(message.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Business(_) => StatusCode::OK,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Envelope code: the HTTP status for gate failures, 1 for business errors.
    pub fn code(&self) -> i32 {
        match self {
            ApiError::Business(_) => CODE_BUSINESS_ERROR,
            other => i32::from(other.status_code().as_u16()),
        }
    }

    /// Message shown to the caller. Gate failures are deliberately generic.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::MalformedRequest(_) => "bad request".to_string(),
            ApiError::Unauthenticated => "unauthorized".to_string(),
            ApiError::Forbidden => "forbidden".to_string(),
            ApiError::RateLimited => "too many requests".to_string(),
            ApiError::Business(message) => message.clone(),
            ApiError::Internal(_) => "internal server error".to_string(),
        }
    }

    /// Render the response and attach `note` as the access-log error text.
    pub fn into_response_with_note(self, note: impl Into<String>) -> Response {
        let mut response = self.into_response();
        response.extensions_mut().insert(ErrorNote(note.into()));
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(error = %detail, "request failed with internal error");
        }

        let status = self.status_code();
        let body = Json(Envelope::failure(self.code(), self.public_message()));
        let mut response = (status, body).into_response();
        response.extensions_mut().insert(ErrorNote(self.to_string()));
        response
    }
}
