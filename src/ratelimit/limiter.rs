// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sliding-window limiter and its Axum middleware.
//!
//! Prune, count and record are separate store calls, so concurrent requests
//! for the same key can overshoot `burst` slightly. No cross-process lock is
//! taken.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::store::{StoreError, WindowStore};
use crate::error::ApiError;

/// Store calls taking longer than this are treated as an outage.
const STORE_DEADLINE: Duration = Duration::from_millis(250);

const KEY_PREFIX: &str = "ratelimit:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Limited,
}

pub struct RateLimiter {
    store: Arc<dyn WindowStore>,
    window: Duration,
    burst: u64,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn WindowStore>, window: Duration, burst: u64) -> Self {
        Self {
            store,
            window,
            burst,
            enabled: true,
        }
    }

    /// A limiter that lets every request through without touching the store.
    pub fn disabled(store: Arc<dyn WindowStore>) -> Self {
        Self {
            store,
            window: Duration::from_secs(1),
            burst: u64::MAX,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn key_for(client: &str) -> String {
        format!("{KEY_PREFIX}{client}")
    }

    /// Run one prune/count/record cycle for `key` at `now_ms`.
    pub async fn check_at(&self, key: &str, now_ms: i64) -> Result<Decision, StoreError> {
        if !self.enabled {
            return Ok(Decision::Allowed);
        }

        let window_ms = i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX);
        let window_start = now_ms.saturating_sub(window_ms);

        self.store.prune(key, window_start).await?;
        let count = self.store.count(key).await?;
        if count >= self.burst {
            // Rejected attempts are not recorded.
            return Ok(Decision::Limited);
        }

        self.store.record(key, now_ms, self.window).await?;
        Ok(Decision::Allowed)
    }

    /// Check `key` against the wall clock. Fails open on store errors or
    /// when the store misses [`STORE_DEADLINE`].
    pub async fn check(&self, key: &str) -> Decision {
        let now_ms = chrono::Utc::now().timestamp_millis();

        match tokio::time::timeout(STORE_DEADLINE, self.check_at(key, now_ms)).await {
            Ok(Ok(decision)) => decision,
            Ok(Err(e)) => {
                warn!(key, error = %e, "rate-limit store error, allowing request");
                Decision::Allowed
            }
            Err(_) => {
                warn!(
                    key,
                    deadline_ms = STORE_DEADLINE.as_millis() as u64,
                    "rate-limit store timed out, allowing request"
                );
                Decision::Allowed
            }
        }
    }
}

/// Rate-limiting middleware keyed by the connecting peer's IP.
pub async fn rate_gate(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let key = RateLimiter::key_for(&client);

    match limiter.check(&key).await {
        Decision::Allowed => next.run(request).await,
        Decision::Limited => {
            debug!(client, "request rate limited");
            ApiError::RateLimited
                .into_response_with_note(format!("rate limit exceeded for {client}"))
        }
    }
}
