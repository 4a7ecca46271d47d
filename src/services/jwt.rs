// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Decode-only access token inspection.
//!
//! The client never holds the signing key, so tokens are decoded without
//! verifying the signature. This is only used to decide when to refresh;
//! the backend verifies every token it receives.

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Claims read from the access token payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

/// Decode the payload without checking the signature or any time claim.
pub fn decode_unverified(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation).map(|data| data.claims)
}

/// Whether `token` expires before `now + buffer`. Undecodable tokens count
/// as expired.
pub fn expires_within(token: &str, now: i64, buffer: Duration) -> bool {
    match decode_unverified(token) {
        Ok(claims) => claims.exp < now + buffer.as_secs() as i64,
        Err(e) => {
            tracing::warn!(error = %e, "Error decoding access token");
            true
        }
    }
}

/// Current Unix time in seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}
