// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verifier capability and the signature/registered-claim checks shared
//! by every provider.

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use super::claims::{RawClaims, VerifiedClaims};
use super::error::{KeyFetchError, VerificationError};
use super::jwks::SigningKeyCache;
use crate::config::ProviderKind;

/// Clock skew tolerance (60 seconds).
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// Asymmetric algorithms accepted from any provider.
pub const ACCEPTED_ALGORITHMS: &[Algorithm] = &[Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// Validates a raw bearer token for one identity provider family.
///
/// Implementations must never return claims for a token whose signature does
/// not verify.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    fn provider(&self) -> ProviderKind;

    async fn verify(&self, raw_token: &str) -> Result<VerifiedClaims, VerificationError>;

    /// Fetch signing keys ahead of the first request.
    async fn warm_up(&self) -> Result<usize, KeyFetchError> {
        Ok(0)
    }

    /// Whether the verifier can verify without first reaching the provider.
    fn is_ready(&self) -> bool {
        true
    }
}

/// What a provider requires of a token's header and registered claims.
#[derive(Debug, Clone)]
pub struct JwtPolicy {
    /// Accepted issuers; `None` skips the issuer check.
    pub issuers: Option<Vec<String>>,
    pub audience: String,
    pub leeway_secs: u64,
}

impl JwtPolicy {
    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.algorithms = vec![algorithm];
        validation.leeway = self.leeway_secs;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_audience(&[&self.audience]);

        match &self.issuers {
            Some(issuers) => {
                validation.set_issuer(issuers.as_slice());
                validation.set_required_spec_claims(&["exp", "aud", "iss"]);
            }
            None => validation.set_required_spec_claims(&["exp", "aud"]),
        }
        validation
    }
}

/// Verify signature, algorithm, expiry, audience and (optionally) issuer.
///
/// The header `alg` must be an accepted asymmetric algorithm and must equal the
/// algorithm the resolved key is bound to, so a token cannot pick a weaker or
/// symmetric verification path.
pub async fn verify_signed(
    raw_token: &str,
    keys: &SigningKeyCache,
    policy: &JwtPolicy,
) -> Result<RawClaims, VerificationError> {
    let header = decode_header(raw_token)
        .map_err(|e| VerificationError::InvalidToken(format!("malformed token header: {e}")))?;

    if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
        return Err(VerificationError::InvalidToken(format!(
            "algorithm {:?} is not accepted",
            header.alg
        )));
    }

    let kid = header
        .kid
        .as_deref()
        .ok_or_else(|| VerificationError::InvalidToken("token header has no key id".to_string()))?;

    let key = keys.get_key(kid).await?;
    if key.algorithm() != header.alg {
        return Err(VerificationError::InvalidToken(format!(
            "token algorithm {:?} does not match key {} ({:?})",
            header.alg,
            key.key_id(),
            key.algorithm()
        )));
    }

    let data = decode::<RawClaims>(raw_token, key.decoding_key(), &policy.validation(header.alg))?;
    Ok(data.claims)
}
