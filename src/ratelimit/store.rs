// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared ordered counter stores for the sliding-window limiter.
//!
//! ## Layout
//!
//! One sorted collection per client key, member = unique event id,
//! score = event timestamp in milliseconds:
//!
//! ```text
//! ratelimit:203.0.113.7  ->  { "1700000000123-<uuid>": 1700000000123, ... }
//! ```
//!
//! Each operation is individually safe for concurrent use; sequences of
//! operations are not atomic (see [`RateLimiter`](super::RateLimiter)).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Operations the limiter needs from the counter store.
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Remove every event for `key` with a timestamp strictly before `before_ms`.
    async fn prune(&self, key: &str, before_ms: i64) -> Result<(), StoreError>;

    /// Number of events currently stored for `key`.
    async fn count(&self, key: &str) -> Result<u64, StoreError>;

    /// Record one event at `at_ms` and refresh the key's idle expiry to `ttl`.
    async fn record(&self, key: &str, at_ms: i64, ttl: Duration) -> Result<(), StoreError>;
}

// =============================================================================
// Redis
// =============================================================================

/// Redis sorted-set store shared by every server process.
#[derive(Clone)]
pub struct RedisWindowStore {
    conn: ConnectionManager,
}

impl RedisWindowStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Connected to Redis rate-limit store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl WindowStore for RedisWindowStore {
    async fn prune(&self, key: &str, before_ms: i64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        // Exclusive upper bound: events exactly at the window start survive.
        let _: () = conn
            .zrembyscore(key, "-inf", format!("({before_ms}"))
            .await?;
        Ok(())
    }

    async fn count(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let count: u64 = conn.zcard(key).await?;
        Ok(count)
    }

    async fn record(&self, key: &str, at_ms: i64, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let member = format!("{at_ms}-{}", uuid::Uuid::new_v4());
        let ttl_secs = i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX);

        // Pipelined but not MULTI/EXEC: the limiter is best effort by design.
        let _: () = redis::pipe()
            .zadd(key, member, at_ms)
            .ignore()
            .expire(key, ttl_secs)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

// =============================================================================
// In-process
// =============================================================================

struct Window {
    events: VecDeque<i64>,
    expires_at_ms: i64,
}

/// Single-process store with the same semantics as the Redis store.
///
/// Used when no Redis URL is configured, and in tests. Idle keys are removed
/// once pruning empties them or by [`MemoryWindowStore::purge_expired`].
#[derive(Default)]
pub struct MemoryWindowStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Window>>, StoreError> {
        self.windows
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))
    }

    /// Drop keys whose idle expiry has passed. Returns how many were removed.
    pub fn purge_expired(&self, now_ms: i64) -> usize {
        let Ok(mut windows) = self.windows.lock() else {
            return 0;
        };
        let before = windows.len();
        windows.retain(|_, window| window.expires_at_ms > now_ms);
        before - windows.len()
    }

    /// Number of keys currently tracked.
    pub fn key_count(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }

    /// Periodically purge idle keys until the cancellation token fires.
    ///
    /// ```rust,ignore
    /// tokio::spawn(store.clone().run_janitor(Duration::from_secs(60), shutdown.clone()));
    /// ```
    pub async fn run_janitor(
        self: std::sync::Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let removed = self.purge_expired(chrono::Utc::now().timestamp_millis());
                    if removed > 0 {
                        debug!(
                            removed,
                            remaining = self.key_count(),
                            "Purged idle rate-limit windows"
                        );
                    }
                }
                _ = shutdown.cancelled() => {
                    debug!("Rate-limit janitor shutting down");
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl WindowStore for MemoryWindowStore {
    async fn prune(&self, key: &str, before_ms: i64) -> Result<(), StoreError> {
        let mut windows = self.lock()?;
        let emptied = match windows.get_mut(key) {
            Some(window) => {
                window.events.retain(|&at| at >= before_ms);
                window.events.is_empty()
            }
            None => false,
        };
        if emptied {
            windows.remove(key);
        }
        Ok(())
    }

    async fn count(&self, key: &str) -> Result<u64, StoreError> {
        let windows = self.lock()?;
        Ok(windows.get(key).map_or(0, |w| w.events.len() as u64))
    }

    async fn record(&self, key: &str, at_ms: i64, ttl: Duration) -> Result<(), StoreError> {
        let mut windows = self.lock()?;
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let window = windows.entry(key.to_string()).or_insert_with(|| Window {
            events: VecDeque::new(),
            expires_at_ms: 0,
        });
        window.events.push_back(at_ms);
        window.expires_at_ms = at_ms.saturating_add(ttl_ms);
        Ok(())
    }
}
