// SPDX-FileCopyrightText: 2025 Caution SEZC
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

//! Double-submit CSRF tokens for the login form.
//!
//! A random token is set both as a short-lived cookie and as a hidden
//! form field when the login page renders; a cross-site attacker can
//! trigger the POST but cannot read or set the victim's cookies for this
//! origin, so the two copies can only match for a legitimate submission.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const TOKEN_BYTES: usize = 24;

/// Mint a fresh random token.
pub fn mint() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Double-submit check: the form field and the cookie must both be
/// present and carry the same token.
pub fn verify(submitted: &str, cookie_value: &str) -> bool {
    if submitted.is_empty() || cookie_value.is_empty() {
        return false;
    }
    digest_eq(submitted, cookie_value)
}

/// Equality via SHA-256 digests, so the final constant-time comparison
/// always runs over fixed-length inputs whatever the length of the
/// attacker-controlled value. Also used for the password check.
pub fn digest_eq(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());
    bool::from(a.as_slice().ct_eq(b.as_slice()))
}
