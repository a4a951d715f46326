// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the account endpoints. Responses are
//! wrapped in the `{code, message, data}` envelope; the types here are the
//! `data` part.
//!
//! Profiles are built from the stored records and never carry the
//! password hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AdminRank;
use crate::storage::{AdminRecord, UserRecord};

/// Field rules checked after a request body deserializes.
pub trait Validate {
    /// Returns a short description of the first violated rule.
    fn validate(&self) -> Result<(), String>;
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(format!("{field} must be {min} to {max} characters"));
    }
    Ok(())
}

fn check_required(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(())
}

/// Loose shape check: `local@domain.tld`, no whitespace.
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// 3 to 50 characters, unique.
    pub username: String,
    /// 6 to 50 characters.
    pub password: String,
    /// Unique, case-insensitive.
    pub email: String,
    #[serde(default)]
    pub nickname: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), String> {
        check_len("username", &self.username, 3, 50)?;
        check_len("password", &self.password, 6, 50)?;
        check_required("email", &self.email)?;
        if !is_plausible_email(&self.email) {
            return Err("email is not a valid address".to_string());
        }
        check_len("nickname", &self.nickname, 0, 50)
    }
}

/// Credentials for both user and admin login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        check_required("username", &self.username)?;
        check_required("password", &self.password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub nickname: String,
    /// 1 active, 0 disabled
    pub status: i32,
    /// 1 normal, 2 VIP, 3 SVIP
    pub level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            nickname: record.nickname,
            status: record.status,
            level: record.level,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserLoginResponse {
    pub token: String,
    pub user_info: UserProfile,
}

// =============================================================================
// Admins
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminProfile {
    pub id: u64,
    pub username: String,
    /// Privilege rank, 1 is highest.
    #[schema(value_type = i64, example = 2)]
    pub role: AdminRank,
    pub status: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AdminRecord> for AdminProfile {
    fn from(record: AdminRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            role: record.rank,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminLoginResponse {
    pub token: String,
    pub admin_info: AdminProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAdminRequest {
    /// 3 to 50 characters, unique among admins.
    pub username: String,
    /// 6 to 50 characters.
    pub password: String,
    /// Rank value: 1 super admin, 2 admin, 3 operator.
    pub role: i64,
}

impl CreateAdminRequest {
    pub fn rank(&self) -> Option<AdminRank> {
        AdminRank::try_from(self.role).ok()
    }
}

impl Validate for CreateAdminRequest {
    fn validate(&self) -> Result<(), String> {
        check_len("username", &self.username, 3, 50)?;
        check_len("password", &self.password, 6, 50)?;
        if self.rank().is_none() {
            return Err(format!("role {} is not a known rank", self.role));
        }
        Ok(())
    }
}

/// One selectable admin rank.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleInfo {
    pub value: i64,
    pub label: String,
}

impl From<AdminRank> for RoleInfo {
    fn from(rank: AdminRank) -> Self {
        Self {
            value: rank.value(),
            label: rank.label().to_string(),
        }
    }
}
