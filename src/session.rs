// SPDX-FileCopyrightText: 2025 Caution SEZC
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Commercial

//! Signed stateless session tokens.
//!
//! A token is `base64url(json {"exp": unix_seconds}) . base64url(hmac-sha256)`.
//! Validity is recomputable from the token, the shared secret, and the
//! clock alone, so any process holding the secret can verify tokens
//! issued by any other instance.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize)]
struct Claims {
    exp: i64,
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn sign(secret: &str, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Issue a token expiring `ttl_hours` from now.
pub fn create(secret: &str, ttl_hours: i64) -> String {
    create_at(secret, ttl_hours, now_unix())
}

fn create_at(secret: &str, ttl_hours: i64, now: i64) -> String {
    let exp = now + ttl_hours * 3600;
    let claims = serde_json::to_vec(&Claims { exp }).expect("claims serialize");
    let payload = URL_SAFE_NO_PAD.encode(claims);
    let signature = sign(secret, &payload);
    format!("{payload}.{signature}")
}

/// Check a presented token. Returns false (never errors) on any defect:
/// missing separator, signature length mismatch, MAC mismatch,
/// undecodable payload, or expiry at or before now. The signature
/// comparison is constant-time; the length check before it is a
/// deterministic failure, not a data-dependent branch.
pub fn verify(secret: &str, token: &str) -> bool {
    verify_at(secret, token, now_unix())
}

fn verify_at(secret: &str, token: &str, now: i64) -> bool {
    let Some((payload, signature)) = token.split_once('.') else {
        return false;
    };

    let expected = sign(secret, payload);
    if signature.len() != expected.len() {
        return false;
    }
    if !bool::from(signature.as_bytes().ct_eq(expected.as_bytes())) {
        return false;
    }

    let Ok(raw) = URL_SAFE_NO_PAD.decode(payload) else {
        return false;
    };
    let Ok(claims) = serde_json::from_slice::<Claims>(&raw) else {
        return false;
    };

    claims.exp > now
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn round_trip_within_ttl() {
        let issued_at = 1_700_000_000;
        let token = create_at(SECRET, 2, issued_at);
        assert!(verify_at(SECRET, &token, issued_at));
        assert!(verify_at(SECRET, &token, issued_at + 2 * 3600 - 1));
    }

    #[test]
    fn expires_at_the_boundary() {
        let issued_at = 1_700_000_000;
        let token = create_at(SECRET, 1, issued_at);
        assert!(!verify_at(SECRET, &token, issued_at + 3600));
        assert!(!verify_at(SECRET, &token, issued_at + 3600 + 1));
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = create_at(SECRET, 1, 1_700_000_000);
        assert!(!verify_at("other-secret", &token, 1_700_000_000));
    }

    #[test]
    fn rejects_tampered_payload() {
        let issued_at = 1_700_000_000;
        let token = create_at(SECRET, 1, issued_at);
        let (payload, signature) = token.split_once('.').unwrap();
        let mut altered: Vec<char> = payload.chars().collect();
        altered[0] = if altered[0] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{}.{signature}", altered.into_iter().collect::<String>());
        assert!(!verify_at(SECRET, &tampered, issued_at));
    }

    #[test]
    fn rejects_tampered_signature() {
        let issued_at = 1_700_000_000;
        let token = create_at(SECRET, 1, issued_at);
        let (payload, signature) = token.split_once('.').unwrap();
        let mut altered: Vec<char> = signature.chars().collect();
        let last = altered.len() - 1;
        altered[last] = if altered[last] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{payload}.{}", altered.into_iter().collect::<String>());
        assert!(!verify_at(SECRET, &tampered, issued_at));
    }

    #[test]
    fn rejects_signature_of_wrong_length() {
        let issued_at = 1_700_000_000;
        let token = create_at(SECRET, 1, issued_at);
        let truncated = &token[..token.len() - 1];
        assert!(!verify_at(SECRET, truncated, issued_at));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(!verify_at(SECRET, "", 0));
        assert!(!verify_at(SECRET, "no-separator", 0));
        assert!(!verify_at(SECRET, ".", 0));
        assert!(!verify_at(SECRET, "not base64.not base64", 0));
    }

    #[test]
    fn rejects_non_claims_payload() {
        // Correctly signed, but the payload is not the expected structure.
        let payload = URL_SAFE_NO_PAD.encode(b"[1,2,3]");
        let signature = sign(SECRET, &payload);
        let token = format!("{payload}.{signature}");
        assert!(!verify_at(SECRET, &token, 0));
    }
}
