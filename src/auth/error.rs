// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token codec errors.
//!
//! These never reach the caller verbatim: the authentication gate collapses
//! every variant into a generic 401 and only logs the specific reason.

/// Failure to issue or verify a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Token is not a parsable JWS or its claims are incomplete
    #[error("token is malformed")]
    MalformedToken,
    /// Signature mismatch or a non-HMAC algorithm in the header
    #[error("token signature is invalid")]
    InvalidSignature,
    /// Token is past its expiry
    #[error("token has expired")]
    Expired,
    /// Token is used before its not-before time
    #[error("token is not yet valid")]
    NotYetValid,
    /// Requested lifetime is zero or pushes expiry past the representable range
    #[error("token lifetime must be positive")]
    InvalidLifetime,
    /// Signing failed
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    /// Short machine-readable reason, used in server-side logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::MalformedToken => "malformed_token",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "token_expired",
            TokenError::NotYetValid => "token_not_yet_valid",
            TokenError::InvalidLifetime => "invalid_lifetime",
            TokenError::Signing(_) => "signing_failed",
        }
    }
}
