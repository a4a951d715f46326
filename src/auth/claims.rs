// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the request-scoped identity derived from them.

use serde::{Deserialize, Serialize};

use super::roles::AdminRank;

/// Which kind of account a token authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Admin,
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrincipalKind::User => write!(f, "user"),
            PrincipalKind::Admin => write!(f, "admin"),
        }
    }
}

/// Principal carried by a token. Only administrators have a rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    User,
    Admin(AdminRank),
}

impl Principal {
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::User => PrincipalKind::User,
            Principal::Admin(_) => PrincipalKind::Admin,
        }
    }

    pub fn rank(&self) -> Option<AdminRank> {
        match self {
            Principal::User => None,
            Principal::Admin(rank) => Some(*rank),
        }
    }
}

/// Signed token payload as it appears on the wire.
///
/// `sub` is the decimal account id; `rank` is only written for admin tokens
/// and is ignored on user tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TokenClaims {
    pub sub: String,
    pub name: String,
    pub typ: PrincipalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Verified claims, reconstructed from a token by
/// [`TokenCodec::verify`](super::codec::TokenCodec::verify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject_id: u64,
    pub display_name: String,
    pub principal: Principal,
    /// Issued at (seconds since epoch)
    pub issued_at: i64,
    /// Not valid before (seconds since epoch)
    pub not_before: i64,
    /// Expiry (seconds since epoch)
    pub expires_at: i64,
}

/// Identity bound into request scope by the authentication gate.
///
/// Handlers receive it through the [`CurrentUser`](super::CurrentUser) and
/// [`CurrentAdmin`](super::CurrentAdmin) extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: u64,
    pub display_name: String,
    pub principal: Principal,
}

impl Identity {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            subject_id: claims.subject_id,
            display_name: claims.display_name,
            principal: claims.principal,
        }
    }

    pub fn kind(&self) -> PrincipalKind {
        self.principal.kind()
    }

    /// Rank of an admin identity, `None` for users.
    pub fn rank(&self) -> Option<AdminRank> {
        self.principal.rank()
    }
}
