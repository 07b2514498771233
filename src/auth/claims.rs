// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified claim set.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::error::VerificationError;

/// Raw JWT payload as decoded after signature and registered-claim checks.
pub type RawClaims = Map<String, Value>;

/// Normalized claims of a token that passed signature, issuer, audience and
/// expiry validation.
///
/// Created per request by a verifier and dropped when the request completes.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaims {
    /// Identity used for the directory lookup, chosen by provider rules.
    pub subject_identity: String,
    pub issuer: String,
    /// The configured audience the token was accepted for.
    pub audience: String,
    pub expires_at: DateTime<Utc>,
    pub raw: RawClaims,
}

impl VerifiedClaims {
    /// Build from a validated payload.
    ///
    /// `audience` is the configured value the token was validated against; the
    /// raw `aud` may be a string or an array.
    pub fn new(
        raw: RawClaims,
        subject_identity: String,
        audience: &str,
    ) -> Result<Self, VerificationError> {
        let exp = raw
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or(VerificationError::MissingClaim("exp"))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| VerificationError::InvalidToken("expiry is out of range".to_string()))?;

        Ok(Self {
            subject_identity,
            issuer: string_claim(&raw, "iss").unwrap_or_default().to_string(),
            audience: audience.to_string(),
            expires_at,
            raw,
        })
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }
}

/// Non-empty string claim, exactly as signed. No trimming or case folding.
pub fn string_claim<'a>(raw: &'a RawClaims, name: &str) -> Option<&'a str> {
    raw.get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Boolean claim that some providers send as `"true"` / `"false"` strings.
pub fn bool_claim(raw: &RawClaims, name: &str) -> Option<bool> {
    match raw.get(name)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
