// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Microsoft Entra ID token verification.
//!
//! Signing keys are located through the tenant's OIDC discovery document,
//! fetched lazily on first use. The subject identity is `preferred_username`,
//! falling back to `upn`.

use async_trait::async_trait;

use super::claims::{string_claim, VerifiedClaims};
use super::error::{KeyFetchError, VerificationError};
use super::jwks::{KeyCacheOptions, KeySource, SigningKeyCache};
use super::verifier::{verify_signed, JwtPolicy, TokenVerifier};
use crate::config::{EntraSettings, ProviderKind};

/// Identity claims in order of preference.
const IDENTITY_CLAIMS: [&str; 2] = ["preferred_username", "upn"];

/// Verifies Entra tokens against keys discovered for one tenant.
pub struct EntraIdVerifier {
    keys: SigningKeyCache,
    policy: JwtPolicy,
}

impl EntraIdVerifier {
    /// `issuer` of `None` skips the issuer check.
    pub fn new(
        client_id: impl Into<String>,
        issuer: Option<String>,
        keys: SigningKeyCache,
        leeway_secs: u64,
    ) -> Self {
        Self {
            keys,
            policy: JwtPolicy {
                issuers: issuer.map(|iss| vec![iss]),
                audience: client_id.into(),
                leeway_secs,
            },
        }
    }

    pub fn from_settings(settings: &EntraSettings, options: KeyCacheOptions, leeway_secs: u64) -> Self {
        let keys = SigningKeyCache::with_options(
            KeySource::Discovery(settings.discovery_url.clone()),
            options,
        );
        Self::new(settings.client_id.clone(), settings.issuer.clone(), keys, leeway_secs)
    }

    pub fn keys(&self) -> &SigningKeyCache {
        &self.keys
    }
}

#[async_trait]
impl TokenVerifier for EntraIdVerifier {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Entra
    }

    async fn verify(&self, raw_token: &str) -> Result<VerifiedClaims, VerificationError> {
        let raw = verify_signed(raw_token, &self.keys, &self.policy).await?;

        let identity = IDENTITY_CLAIMS
            .iter()
            .find_map(|name| string_claim(&raw, name))
            .ok_or(VerificationError::MissingClaim("preferred_username or upn"))?
            .to_string();

        VerifiedClaims::new(raw, identity, &self.policy.audience)
    }

    async fn warm_up(&self) -> Result<usize, KeyFetchError> {
        self.keys.warm_up().await
    }

    fn is_ready(&self) -> bool {
        self.keys.is_warm()
    }
}
