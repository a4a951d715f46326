// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gatekeeper - request-gating API server
//!
//! Authenticates callers with signed stateless tokens, authorizes admins by
//! rank and throttles clients with a shared sliding-window counter, all
//! before a request reaches the account handlers.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers and route table (Axum)
//! - `auth` - token codec, authentication and rank gates, password hashing
//! - `ratelimit` - sliding-window limiter over Redis or an in-process store
//! - `pipeline` - global layers: panic boundary, access log, CORS, rate gate
//! - `storage` - embedded account database (redb)
//! - `config` / `logging` - startup settings and log sinks

pub mod api;
pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod ratelimit;
pub mod state;
pub mod storage;
