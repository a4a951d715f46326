// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing with PBKDF2-HMAC-SHA256.
//!
//! Encoded form: `pbkdf2-sha256$<iterations>$<b64 salt>$<b64 hash>`.
//! The iteration count travels with the hash so it can be raised later
//! without invalidating stored passwords.

use std::sync::LazyLock;

use base64ct::{Base64, Encoding};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2-sha256";
const ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Stand-in hash for logins whose username matched nothing.
static MISS_HASH: LazyLock<String> = LazyLock::new(|| hash_password("no-such-account"));

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, ITERATIONS, &mut hash);

    format!(
        "{SCHEME}${ITERATIONS}${}${}",
        Base64::encode_string(&salt),
        Base64::encode_string(&hash)
    )
}

/// Check a password against an encoded hash in constant time.
///
/// Returns `false` for unparsable hashes rather than erroring.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut fields = encoded.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return false;
    };

    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (Base64::decode_vec(salt), Base64::decode_vec(expected)) else {
        return false;
    };
    if iterations == 0 || expected.is_empty() {
        return false;
    }

    let mut computed = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut computed);
    computed.ct_eq(&expected).into()
}

/// Run one full verification against a throwaway hash.
///
/// Login calls this when the username is unknown so the miss costs the same
/// as a wrong password. Always returns `false`.
pub fn verify_against_nothing(password: &str) -> bool {
    let _ = verify_password(password, &MISS_HASH);
    false
}
