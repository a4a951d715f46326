// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded account database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user id → serialized UserRecord
//! - `admins`: admin id → serialized AdminRecord
//! - `user_usernames`: username → user id
//! - `user_emails`: lowercase email → user id
//! - `admin_usernames`: username → admin id
//! - `sequences`: table name → last issued id
//!
//! Uniqueness checks and inserts for one account happen in a single write
//! transaction, so two concurrent registrations cannot both take a name.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use super::cache::{AdminCache, ADMIN_CACHE_TTL};
use crate::auth::AdminRank;

// =============================================================================
// Table Definitions
// =============================================================================

const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
const ADMINS: TableDefinition<u64, &[u8]> = TableDefinition::new("admins");
const USER_USERNAMES: TableDefinition<&str, u64> = TableDefinition::new("user_usernames");
const USER_EMAILS: TableDefinition<&str, u64> = TableDefinition::new("user_emails");
const ADMIN_USERNAMES: TableDefinition<&str, u64> = TableDefinition::new("admin_usernames");
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

const ADMIN_CACHE_CAPACITY: usize = 256;

pub const STATUS_ACTIVE: i32 = 1;
pub const STATUS_DISABLED: i32 = 0;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AccountStoreError {
    #[error("failed to create data directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("username already exists")]
    UsernameTaken,

    #[error("email already registered")]
    EmailTaken,

    #[error("not found: {0}")]
    NotFound(String),
}

pub type AccountResult<T> = Result<T, AccountStoreError>;

// =============================================================================
// Records
// =============================================================================

/// Stored end-user account. `password_hash` never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub nickname: String,
    /// 1 active, 0 disabled
    pub status: i32,
    /// 1 normal, 2 VIP, 3 SVIP
    pub level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

/// Stored administrator account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRecord {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub rank: AdminRank,
    pub status: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminRecord {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub nickname: String,
}

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub username: String,
    pub password_hash: String,
    pub rank: AdminRank,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// AccountStore
// =============================================================================

pub struct AccountStore {
    db: Database,
    admin_cache: AdminCache,
}

impl AccountStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> AccountResult<Self> {
        Self::open_with_cache_ttl(path, ADMIN_CACHE_TTL)
    }

    pub fn open_with_cache_ttl(path: &Path, cache_ttl: Duration) -> AccountResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(ADMINS)?;
            let _ = write_txn.open_table(USER_USERNAMES)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
            let _ = write_txn.open_table(ADMIN_USERNAMES)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            admin_cache: AdminCache::new(ADMIN_CACHE_CAPACITY, cache_ttl),
        })
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn get_user_by_id(&self, id: u64) -> AccountResult<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        let value = table.get(id)?;
        match value {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_user_by_username(&self, username: &str) -> AccountResult<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_USERNAMES)?;
        let Some(id) = index.get(username)?.map(|v| v.value()) else {
            return Ok(None);
        };
        self.get_user_by_id(id)
    }

    pub fn user_email_taken(&self, email: &str) -> AccountResult<bool> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_EMAILS)?;
        let taken = index.get(normalize_email(email).as_str())?.is_some();
        Ok(taken)
    }

    /// Insert a user, enforcing unique username and email.
    pub fn create_user(&self, new: NewUser) -> AccountResult<UserRecord> {
        let email_key = normalize_email(&new.email);
        let now = Utc::now();

        let write_txn = self.db.begin_write()?;
        let record = {
            let mut usernames = write_txn.open_table(USER_USERNAMES)?;
            if usernames.get(new.username.as_str())?.is_some() {
                return Err(AccountStoreError::UsernameTaken);
            }
            let mut emails = write_txn.open_table(USER_EMAILS)?;
            if !email_key.is_empty() && emails.get(email_key.as_str())?.is_some() {
                return Err(AccountStoreError::EmailTaken);
            }

            let id = next_id(&write_txn, "users")?;
            let record = UserRecord {
                id,
                username: new.username,
                password_hash: new.password_hash,
                email: new.email,
                nickname: new.nickname,
                status: STATUS_ACTIVE,
                level: 1,
                created_at: now,
                updated_at: now,
            };

            let json = serde_json::to_vec(&record)?;
            write_txn.open_table(USERS)?.insert(id, json.as_slice())?;
            usernames.insert(record.username.as_str(), id)?;
            if !email_key.is_empty() {
                emails.insert(email_key.as_str(), id)?;
            }
            record
        };
        write_txn.commit()?;

        tracing::debug!(user_id = record.id, username = %record.username, "Created user");
        Ok(record)
    }

    pub fn set_user_status(&self, id: u64, status: i32) -> AccountResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(USERS)?;
            let mut record: UserRecord = match table.get(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(AccountStoreError::NotFound(format!("user {id}"))),
            };
            record.status = status;
            record.updated_at = Utc::now();
            let json = serde_json::to_vec(&record)?;
            table.insert(id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // Admins
    // =========================================================================

    /// Look up an admin by id, served from the LRU cache when fresh.
    pub fn get_admin_by_id(&self, id: u64) -> AccountResult<Option<AdminRecord>> {
        if let Some(admin) = self.admin_cache.get(id) {
            return Ok(Some(admin));
        }
        let generation = self.admin_cache.generation();

        let admin: Option<AdminRecord> = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(ADMINS)?;
            let value = table.get(id)?;
            match value {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            }
        };

        if let (Some(admin), Some(generation)) = (&admin, generation) {
            self.admin_cache.put_if_current(admin.clone(), generation);
        }
        Ok(admin)
    }

    pub fn get_admin_by_username(&self, username: &str) -> AccountResult<Option<AdminRecord>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ADMIN_USERNAMES)?;
        let Some(id) = index.get(username)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let table = read_txn.open_table(ADMINS)?;
        let value = table.get(id)?;
        match value {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn create_admin(&self, new: NewAdmin) -> AccountResult<AdminRecord> {
        let now = Utc::now();

        let write_txn = self.db.begin_write()?;
        let record = {
            let mut usernames = write_txn.open_table(ADMIN_USERNAMES)?;
            if usernames.get(new.username.as_str())?.is_some() {
                return Err(AccountStoreError::UsernameTaken);
            }

            let id = next_id(&write_txn, "admins")?;
            let record = AdminRecord {
                id,
                username: new.username,
                password_hash: new.password_hash,
                rank: new.rank,
                status: STATUS_ACTIVE,
                created_at: now,
                updated_at: now,
            };

            let json = serde_json::to_vec(&record)?;
            write_txn.open_table(ADMINS)?.insert(id, json.as_slice())?;
            usernames.insert(record.username.as_str(), id)?;
            record
        };
        write_txn.commit()?;

        self.admin_cache.invalidate(record.id);
        tracing::info!(
            admin_id = record.id,
            username = %record.username,
            rank = record.rank.value(),
            "Created admin"
        );
        Ok(record)
    }

    pub fn set_admin_status(&self, id: u64, status: i32) -> AccountResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ADMINS)?;
            let mut record: AdminRecord = match table.get(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(AccountStoreError::NotFound(format!("admin {id}"))),
            };
            record.status = status;
            record.updated_at = Utc::now();
            let json = serde_json::to_vec(&record)?;
            table.insert(id, json.as_slice())?;
        }
        write_txn.commit()?;

        self.admin_cache.invalidate(id);
        Ok(())
    }
}

/// Bump and return the id sequence for `name`. Ids start at 1.
fn next_id(write_txn: &redb::WriteTransaction, name: &str) -> AccountResult<u64> {
    let mut sequences = write_txn.open_table(SEQUENCES)?;
    let next = sequences.get(name)?.map_or(0, |v| v.value()) + 1;
    sequences.insert(name, next)?;
    Ok(next)
}

// =============================================================================
// Tests
// =============================================================================
