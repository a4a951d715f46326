// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! One structured log line per request.
//!
//! Failed requests (status >= 400) are logged at ERROR so they also land in
//! the daily error file; everything else at INFO. The value of a `token`
//! query parameter is replaced before logging.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    http::Uri,
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

use crate::error::ErrorNote;

const REDACTED: &str = "[redacted]";

/// Path plus query as it goes into the log, with credentials masked.
fn loggable_path(uri: &Uri) -> String {
    let Some(query) = uri.query() else {
        return uri.path().to_string();
    };

    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("token", _)) => format!("token={REDACTED}"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", uri.path(), query)
}

pub async fn access_log(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = loggable_path(request.uri());
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
    let note = response
        .extensions()
        .get::<ErrorNote>()
        .map(|ErrorNote(text)| text.as_str())
        .unwrap_or("");

    if status.as_u16() >= 400 {
        error!(
            client = %client,
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms,
            error = note,
            "request failed"
        );
    } else {
        info!(
            client = %client,
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms,
            error = note,
            "request completed"
        );
    }

    response
}
