// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for admin lookups by id.
//!
//! Every request on an admin route resolves the admin record; this keeps the
//! hot ones out of redb for a while. Entries expire after `ttl` and are
//! dropped whenever the record changes.
//!
//! Every invalidation bumps a generation counter. A reader takes the
//! generation before going to the database and only caches what it read if
//! no invalidation happened in between, so a record read just before a
//! status change cannot be put back after it.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use super::accounts::AdminRecord;

/// Default lifetime of a cached admin record.
pub const ADMIN_CACHE_TTL: Duration = Duration::from_secs(1800);

struct CacheEntry {
    admin: AdminRecord,
    inserted_at: Instant,
}

struct Inner {
    entries: LruCache<u64, CacheEntry>,
    generation: u64,
}

pub struct AdminCache {
    inner: Mutex<Inner>,
    ttl: Duration,
}

impl AdminCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
                generation: 0,
            }),
            ttl,
        }
    }

    /// Returns `None` if not cached or expired.
    pub fn get(&self, id: u64) -> Option<AdminRecord> {
        let mut inner = self.inner.lock().ok()?;
        if let Some(entry) = inner.entries.get(&id) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.admin.clone());
            }
            inner.entries.pop(&id);
        }
        None
    }

    /// Current generation; pass it to [`AdminCache::put_if_current`].
    /// `None` only if the lock is poisoned.
    pub fn generation(&self) -> Option<u64> {
        self.inner.lock().ok().map(|inner| inner.generation)
    }

    /// Cache `admin` unless an invalidation happened since `generation` was
    /// taken. Returns whether the record was stored.
    pub fn put_if_current(&self, admin: AdminRecord, generation: u64) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        if inner.generation != generation {
            return false;
        }
        inner.entries.put(
            admin.id,
            CacheEntry {
                admin,
                inserted_at: Instant::now(),
            },
        );
        true
    }

    pub fn invalidate(&self, id: u64) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.generation = inner.generation.wrapping_add(1);
            inner.entries.pop(&id);
        }
    }
}
