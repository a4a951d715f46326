// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Account Storage
//!
//! User and admin accounts live in a single redb file under the configured
//! data directory:
//!
//! ```text
//! <data_dir>/
//!   accounts.redb
//! ```

pub mod accounts;
pub mod cache;

use std::path::{Path, PathBuf};

pub use accounts::{
    AccountResult, AccountStore, AccountStoreError, AdminRecord, NewAdmin, NewUser, UserRecord,
    STATUS_ACTIVE, STATUS_DISABLED,
};
pub use cache::{AdminCache, ADMIN_CACHE_TTL};

pub const ACCOUNTS_FILE: &str = "accounts.redb";

pub fn accounts_path(data_dir: &Path) -> PathBuf {
    data_dir.join(ACCOUNTS_FILE)
}
