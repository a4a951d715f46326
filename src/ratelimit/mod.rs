// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Rate Limiting
//!
//! Per-client sliding-window limiting backed by a shared ordered store
//! (Redis sorted sets across processes, or an in-process map).

pub mod limiter;
pub mod store;

pub use limiter::{rate_gate, Decision, RateLimiter};
pub use store::{MemoryWindowStore, RedisWindowStore, StoreError, WindowStore};
