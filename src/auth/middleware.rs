// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization gates for Axum.
//!
//! Both gates are attached per route group with
//! `axum::middleware::from_fn_with_state`:
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/create", post(create_admin))
//!     .route_layer(from_fn_with_state(RoleGate::new(AdminRank::SuperAdmin), role_gate))
//!     .route_layer(from_fn_with_state(AuthGate::new(codec, PrincipalKind::Admin), auth_gate));
//! ```
//!
//! The last `route_layer` runs first, so the auth gate always precedes the
//! role gate. Either gate aborts the chain on failure: nothing downstream runs.

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, warn};

use super::claims::{Identity, PrincipalKind};
use super::codec::TokenCodec;
use super::roles::AdminRank;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Pull a candidate token out of the request.
///
/// Prefers `Authorization: Bearer <token>`, falls back to the `token` query
/// parameter. A malformed header does not hide a valid query parameter.
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty() && !token.contains(' '));

    if let Some(token) = from_header {
        return Some(token.to_string());
    }

    Query::<TokenQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(query)| query.token)
        .filter(|token| !token.is_empty())
}

/// Authentication gate for one principal type.
#[derive(Clone)]
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    expected: PrincipalKind,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, expected: PrincipalKind) -> Self {
        Self { codec, expected }
    }

    /// Verify a token and check its principal type.
    ///
    /// The error string is the server-side reason; the caller only ever sees
    /// a generic 401.
    pub fn authenticate(&self, token: Option<&str>) -> Result<Identity, &'static str> {
        let token = token.ok_or("missing_token")?;
        let claims = self.codec.verify(token).map_err(|e| e.error_code())?;

        if claims.principal.kind() != self.expected {
            return Err("principal_type_mismatch");
        }
        Ok(Identity::from_claims(claims))
    }
}

/// Authentication middleware: verifies the token and binds an [`Identity`].
pub async fn auth_gate(State(gate): State<AuthGate>, mut request: Request, next: Next) -> Response {
    let token = extract_token(request.headers(), request.uri());

    match gate.authenticate(token.as_deref()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(reason) => {
            debug!(reason, expected = %gate.expected, "authentication rejected");
            ApiError::Unauthenticated.into_response_with_note(reason)
        }
    }
}

/// Authorization gate requiring a minimum admin rank.
#[derive(Debug, Clone, Copy)]
pub struct RoleGate {
    required: AdminRank,
}

impl RoleGate {
    pub fn new(required: AdminRank) -> Self {
        Self { required }
    }

    pub fn authorize(&self, identity: Option<&Identity>) -> Result<(), ApiError> {
        let Some(rank) = identity.and_then(Identity::rank) else {
            return Err(ApiError::Forbidden);
        };

        if rank.satisfies(self.required) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Authorization middleware: must run after [`auth_gate`] for admins.
pub async fn role_gate(State(gate): State<RoleGate>, request: Request, next: Next) -> Response {
    let identity = request.extensions().get::<Identity>();

    match gate.authorize(identity) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            if identity.is_none() {
                warn!("role gate reached without an authenticated identity");
            }
            let note = format!(
                "rank {:?} below required {}",
                identity.and_then(Identity::rank).map(AdminRank::value),
                gate.required.value()
            );
            err.into_response_with_note(note)
        }
    }
}
