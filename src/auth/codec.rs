// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HMAC-signed token issuing and verification.
//!
//! Tokens are compact JWS strings (`header.payload.signature`, URL-safe
//! base64) signed with HS256 over the configured secret. Verification:
//!
//! 1. Parse the header and refuse any algorithm outside the HMAC family
//!    before touching the signature (algorithm-confusion defence)
//! 2. Recompute and compare the signature
//! 3. Check `now < exp`, then `now >= nbf` (no leeway)
//!
//! The codec holds only immutable keys and is safe to share across tasks.

use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;

use super::claims::{Claims, Principal, PrincipalKind, TokenClaims};
use super::error::TokenError;
use super::roles::AdminRank;

/// Algorithm used for newly issued tokens.
const ISSUE_ALGORITHM: Algorithm = Algorithm::HS256;

/// Algorithms accepted on verification.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Just enough of the JOSE header to vet the algorithm by name, so that
/// `none` or an asymmetric algorithm is rejected as a signature failure.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Issues and verifies signed identity tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec over a symmetric secret.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(ISSUE_ALGORITHM);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        // Time checks are done explicitly in `verify_at` against a caller-supplied clock.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token valid from now for `ttl`.
    pub fn issue(
        &self,
        subject_id: u64,
        display_name: &str,
        principal: Principal,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.issue_at(subject_id, display_name, principal, ttl, now_secs())
    }

    /// Issue a token as if the current time were `now` (seconds since epoch).
    pub fn issue_at(
        &self,
        subject_id: u64,
        display_name: &str,
        principal: Principal,
        ttl: Duration,
        now: i64,
    ) -> Result<String, TokenError> {
        let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::InvalidLifetime)?;
        if ttl_secs <= 0 {
            return Err(TokenError::InvalidLifetime);
        }
        let exp = now.checked_add(ttl_secs).ok_or(TokenError::InvalidLifetime)?;

        let claims = TokenClaims {
            sub: subject_id.to_string(),
            name: display_name.to_string(),
            typ: principal.kind(),
            rank: principal.rank().map(AdminRank::value),
            iat: now,
            nbf: now,
            exp,
        };

        encode(&Header::new(ISSUE_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, now_secs())
    }

    /// Verify a token as if the current time were `now` (seconds since epoch).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        check_algorithm(token)?;

        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::MalformedToken,
            }
        })?;
        let raw = data.claims;

        if now >= raw.exp {
            return Err(TokenError::Expired);
        }
        if now < raw.nbf {
            return Err(TokenError::NotYetValid);
        }
        if raw.exp <= raw.iat {
            return Err(TokenError::MalformedToken);
        }

        let subject_id = raw.sub.parse::<u64>().map_err(|_| TokenError::MalformedToken)?;
        let principal = match raw.typ {
            PrincipalKind::User => Principal::User,
            PrincipalKind::Admin => {
                let rank = raw.rank.ok_or(TokenError::MalformedToken)?;
                Principal::Admin(AdminRank::try_from(rank).map_err(|_| TokenError::MalformedToken)?)
            }
        };

        Ok(Claims {
            subject_id,
            display_name: raw.name,
            principal,
            issued_at: raw.iat,
            not_before: raw.nbf,
            expires_at: raw.exp,
        })
    }
}

/// Reject tokens whose header names anything but an HMAC algorithm.
fn check_algorithm(token: &str) -> Result<(), TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(TokenError::MalformedToken);
    };

    let bytes = Base64UrlUnpadded::decode_vec(header).map_err(|_| TokenError::MalformedToken)?;
    let raw: RawHeader = serde_json::from_slice(&bytes).map_err(|_| TokenError::MalformedToken)?;

    match raw.alg.as_str() {
        "HS256" | "HS384" | "HS512" => Ok(()),
        _ => Err(TokenError::InvalidSignature),
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
