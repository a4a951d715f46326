// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Response Envelope
//!
//! Every JSON response body has the shape `{code, message, data?}`.
//!
//! - `code = 0` is business success
//! - any other `code` returned with HTTP 200 is a business failure
//! - gate failures (401/403/429/500) carry the HTTP status as `code`
//!
//! HTTP status is reserved for transport and gate-level failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Business success.
pub const CODE_SUCCESS: i32 = 0;

/// Generic business failure.
pub const CODE_BUSINESS_ERROR: i32 = 1;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: CODE_SUCCESS,
            message: "success".to_string(),
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    /// Success without a payload, e.g. after a create.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            code: CODE_SUCCESS,
            message: message.into(),
            data: None,
        }
    }

    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
