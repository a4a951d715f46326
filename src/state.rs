// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenCodec;
use crate::ratelimit::RateLimiter;
use crate::storage::AccountStore;

/// Shared handler state. Everything is either immutable or synchronizes
/// internally, so clones are cheap `Arc` bumps.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountStore>,
    pub tokens: Arc<TokenCodec>,
    pub limiter: Arc<RateLimiter>,
    pub user_token_ttl: Duration,
    pub admin_token_ttl: Duration,
}

impl AppState {
    pub fn new(
        accounts: AccountStore,
        tokens: TokenCodec,
        limiter: RateLimiter,
        user_token_ttl: Duration,
        admin_token_ttl: Duration,
    ) -> Self {
        Self {
            accounts: Arc::new(accounts),
            tokens: Arc::new(tokens),
            limiter: Arc::new(limiter),
            user_token_ttl,
            admin_token_ttl,
        }
    }
}
