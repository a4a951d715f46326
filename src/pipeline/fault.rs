// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Panic boundary: turns a panicking request into a generic 500.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

use crate::envelope::Envelope;

pub fn layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(handle_panic as fn(Box<dyn Any + Send + 'static>) -> Response)
}

fn panic_detail(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else {
        "non-string panic payload"
    }
}

pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    error!(panic = panic_detail(payload.as_ref()), "request handler panicked");

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    let body = Envelope::failure(i32::from(status.as_u16()), "internal server error");
    (status, Json(body)).into_response()
}
