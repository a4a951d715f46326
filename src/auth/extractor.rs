// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the identity bound by the authentication gate.
//!
//! ```rust,ignore
//! async fn get_user_info(CurrentUser(identity): CurrentUser) -> impl IntoResponse {
//!     // identity.subject_id is the authenticated user's id
//! }
//! ```
//!
//! The extractors never verify tokens themselves: they only read what
//! `auth_gate` attached, and reject if the route was wired without it.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::claims::{Identity, PrincipalKind};
use crate::error::ApiError;

fn identity_of_kind(parts: &Parts, kind: PrincipalKind) -> Result<Identity, ApiError> {
    match parts.extensions.get::<Identity>() {
        Some(identity) if identity.kind() == kind => Ok(identity.clone()),
        Some(_) => Err(ApiError::Unauthenticated),
        None => {
            warn!(path = %parts.uri.path(), "handler requires {kind} identity but no auth gate ran");
            Err(ApiError::Unauthenticated)
        }
    }
}

/// Authenticated end-user.
pub struct CurrentUser(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_of_kind(parts, PrincipalKind::User).map(CurrentUser)
    }
}

/// Authenticated administrator.
pub struct CurrentAdmin(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_of_kind(parts, PrincipalKind::Admin).map(CurrentAdmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{claims::Principal, AdminRank};
    use axum::http::Request;

    fn parts_with(identity: Option<Identity>) -> Parts {
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        if let Some(identity) = identity {
            parts.extensions.insert(identity);
        }
        parts
    }

    #[tokio::test]
    async fn current_user_reads_gate_identity() {
        let mut parts = parts_with(Some(Identity {
            subject_id: 11,
            display_name: "alice".to_string(),
            principal: Principal::User,
        }));

        let CurrentUser(identity) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(identity.subject_id, 11);
    }

    #[tokio::test]
    async fn current_user_rejects_admin_identity() {
        let mut parts = parts_with(Some(Identity {
            subject_id: 1,
            display_name: "root".to_string(),
            principal: Principal::Admin(AdminRank::SuperAdmin),
        }));

        let result = CurrentUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthenticated)));

        let CurrentAdmin(identity) = CurrentAdmin::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(identity.rank(), Some(AdminRank::SuperAdmin));
    }

    #[tokio::test]
    async fn missing_identity_is_unauthenticated() {
        let mut parts = parts_with(None);
        let result = CurrentAdmin::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }
}
