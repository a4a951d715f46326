// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless signed tokens, the authentication and role gates, and
//! password hashing for the login flow.
//!
//! ## Auth Flow
//!
//! 1. Client logs in (`/api/user/login` or `/api/admin/login`)
//! 2. Server issues an HS256 token carrying subject id, display name,
//!    principal type and, for admins, the privilege rank
//! 3. Client sends `Authorization: Bearer <token>` (or `?token=<token>`)
//! 4. `auth_gate` verifies the token and binds an [`Identity`]
//! 5. `role_gate` (admin routes only) checks the rank
//!
//! ## Security
//!
//! - Only HMAC algorithms are accepted; `none` and asymmetric headers are
//!   rejected before signature checks
//! - User tokens never authenticate admin routes and vice versa
//! - Callers get a generic 401/403; the specific reason is only logged

pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod roles;

pub use claims::{Claims, Identity, Principal, PrincipalKind};
pub use codec::TokenCodec;
pub use error::TokenError;
pub use extractor::{CurrentAdmin, CurrentUser};
pub use middleware::{auth_gate, role_gate, AuthGate, RoleGate};
pub use roles::{AdminRank, InvalidRank};
