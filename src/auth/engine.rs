// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization engine.
//!
//! Per request: extract token → verify with the active verifier → resolve the
//! subject identity in the directory. The first failing step ends the flow
//! with a [`DenialReason`]. Nothing here retries.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use super::error::{DenialReason, VerificationError};
use super::registry::VerifierRegistry;
use crate::directory::Directory;
use crate::models::RegisteredUser;

/// Outcome of one authorization flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Authorized(RegisteredUser),
    Denied(DenialReason),
}

impl AuthorizationDecision {
    pub fn into_result(self) -> Result<RegisteredUser, DenialReason> {
        match self {
            AuthorizationDecision::Authorized(user) => Ok(user),
            AuthorizationDecision::Denied(reason) => Err(reason),
        }
    }
}

/// Pull the token out of an authorization header value.
///
/// Accepts `Bearer <token>` (scheme in any case) or a bare token. Returns
/// `None` when nothing usable is present.
pub fn extract_token(header_value: &str) -> Option<&str> {
    let value = header_value.trim();
    let token = match value.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => value[7..].trim(),
        _ if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}

/// Orchestrates verification and directory resolution.
pub struct Authorizer {
    verifiers: VerifierRegistry,
    directory: Arc<Directory>,
}

impl Authorizer {
    pub fn new(verifiers: VerifierRegistry, directory: Arc<Directory>) -> Self {
        Self { verifiers, directory }
    }

    pub fn verifiers(&self) -> &VerifierRegistry {
        &self.verifiers
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Decide on a request given its authorization header value, if any.
    ///
    /// Never panics and never returns an error: every failure becomes
    /// [`AuthorizationDecision::Denied`].
    #[instrument(skip_all, fields(provider = %self.verifiers.active_kind()))]
    pub async fn authorize(&self, header_value: Option<&str>) -> AuthorizationDecision {
        let Some(token) = header_value.and_then(extract_token) else {
            return self.deny(DenialReason::MissingToken);
        };

        let claims = match self.verifiers.active().verify(token).await {
            Ok(claims) => claims,
            Err(err) => return self.deny(denial_for(err)),
        };
        debug!(subject = %claims.subject_identity, "Token verified");

        match self.directory.resolve(&claims.subject_identity) {
            Some(user) => {
                debug!(subject = %claims.subject_identity, "Identity resolved");
                AuthorizationDecision::Authorized(user.clone())
            }
            None => {
                debug!(subject = %claims.subject_identity, "Identity not in directory");
                self.deny(DenialReason::NotRegistered)
            }
        }
    }

    fn deny(&self, reason: DenialReason) -> AuthorizationDecision {
        let code = reason.error_code();
        match &reason {
            DenialReason::UpstreamUnavailable(detail) => {
                warn!(reason = code, %detail, "Request denied, identity provider unavailable")
            }
            DenialReason::Internal(detail) => error!(reason = code, %detail, "Request denied"),
            DenialReason::AuthenticationFailed(cause) => {
                info!(reason = code, cause = cause.code(), detail = %cause, "Request denied")
            }
            DenialReason::MissingToken | DenialReason::NotRegistered => {
                info!(reason = code, "Request denied")
            }
        }
        AuthorizationDecision::Denied(reason)
    }
}

/// Map a verifier failure to a denial. Provider outages and internal faults
/// keep their own class; everything else is an authentication failure.
pub fn denial_for(err: VerificationError) -> DenialReason {
    match err {
        VerificationError::UpstreamUnavailable(detail) => DenialReason::UpstreamUnavailable(detail),
        VerificationError::Internal(detail) => DenialReason::Internal(detail),
        other => DenialReason::AuthenticationFailed(other),
    }
}
