// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Google ID token verification.
//!
//! Google publishes its signing keys at a fixed JWKS URL, so there is no
//! discovery step. The subject identity is the verified `email` claim.

use async_trait::async_trait;
use tracing::debug;

use super::claims::{bool_claim, string_claim, VerifiedClaims};
use super::error::{KeyFetchError, VerificationError};
use super::jwks::{KeyCacheOptions, KeySource, SigningKeyCache};
use super::verifier::{verify_signed, JwtPolicy, TokenVerifier};
use crate::config::{GoogleSettings, ProviderKind};

/// Issuers Google uses for ID tokens.
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Verifies audience-bound Google ID tokens.
pub struct GoogleIdTokenVerifier {
    keys: SigningKeyCache,
    policy: JwtPolicy,
}

impl GoogleIdTokenVerifier {
    pub fn new(client_id: impl Into<String>, keys: SigningKeyCache, leeway_secs: u64) -> Self {
        Self {
            keys,
            policy: JwtPolicy {
                issuers: Some(GOOGLE_ISSUERS.iter().map(|s| s.to_string()).collect()),
                audience: client_id.into(),
                leeway_secs,
            },
        }
    }

    pub fn from_settings(settings: &GoogleSettings, options: KeyCacheOptions, leeway_secs: u64) -> Self {
        let keys = SigningKeyCache::with_options(KeySource::Jwks(settings.jwks_url.clone()), options);
        Self::new(settings.client_id.clone(), keys, leeway_secs)
    }

    pub fn keys(&self) -> &SigningKeyCache {
        &self.keys
    }
}

#[async_trait]
impl TokenVerifier for GoogleIdTokenVerifier {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn verify(&self, raw_token: &str) -> Result<VerifiedClaims, VerificationError> {
        let raw = verify_signed(raw_token, &self.keys, &self.policy).await?;

        let email = string_claim(&raw, "email")
            .ok_or(VerificationError::MissingClaim("email"))?
            .to_string();
        if bool_claim(&raw, "email_verified") == Some(false) {
            debug!("Google token email is not verified");
            return Err(VerificationError::MissingClaim("verified email"));
        }

        VerifiedClaims::new(raw, email, &self.policy.audience)
    }

    async fn warm_up(&self) -> Result<usize, KeyFetchError> {
        self.keys.warm_up().await
    }

    fn is_ready(&self) -> bool {
        self.keys.is_warm()
    }
}
