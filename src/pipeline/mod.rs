// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Pipeline
//!
//! Global layers applied around the whole router, outermost first:
//!
//! ```text
//! FaultContainment -> AccessLog -> CORS -> RateGate -> [AuthGate -> RoleGate] -> handler
//! ```
//!
//! The auth and role gates are attached per route group in [`crate::api`].

pub mod access_log;
pub mod cors;
pub mod fault;

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};

use crate::ratelimit::{rate_gate, RateLimiter};

pub use access_log::access_log;

/// Wrap `router` in the global gate stack.
pub fn apply(router: Router, limiter: Arc<RateLimiter>) -> Router {
    // Layers added later wrap the earlier ones.
    router
        .layer(from_fn_with_state(limiter, rate_gate))
        .layer(cors::layer())
        .layer(from_fn(access_log))
        .layer(fault::layer())
}
