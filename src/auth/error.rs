// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors and denial reasons.
//!
//! Three layers:
//!
//! - [`KeyFetchError`] - signing key cache failures
//! - [`VerificationError`] - token verifier failures (wraps key failures)
//! - [`DenialReason`] - what the authorization engine decided, and how the
//!   boundary renders it ([`AuthRejection`])
//!
//! Detail strings carried by these errors are for logs only. The response body
//! rendered for a caller contains a fixed, non-sensitive message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Signing key cache failure.
///
/// `Clone` because a single refresh outcome is handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyFetchError {
    /// Key set was reachable but does not contain the requested key id.
    #[error("no signing key with id `{0}`")]
    UnknownKeyId(String),
    /// Discovery document or key set could not be fetched or parsed.
    #[error("identity provider keys unavailable: {0}")]
    UpstreamUnavailable(String),
    /// The refresh task itself failed.
    #[error("internal key cache error: {0}")]
    Internal(String),
}

/// Token verification failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Malformed token, bad signature, wrong issuer/audience, expired,
    /// or a disallowed algorithm.
    #[error("invalid token: {0}")]
    InvalidToken(String),
    /// Token verified but carries no usable identity claim.
    #[error("missing claim: {0}")]
    MissingClaim(&'static str),
    #[error("unknown signing key id `{0}`")]
    UnknownKeyId(String),
    #[error("identity provider unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("internal verification error: {0}")]
    Internal(String),
}

impl VerificationError {
    /// Stable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::InvalidToken(_) => "invalid_token",
            VerificationError::MissingClaim(_) => "missing_claim",
            VerificationError::UnknownKeyId(_) => "unknown_key_id",
            VerificationError::UpstreamUnavailable(_) => "upstream_unavailable",
            VerificationError::Internal(_) => "internal_error",
        }
    }
}

impl From<KeyFetchError> for VerificationError {
    fn from(err: KeyFetchError) -> Self {
        match err {
            KeyFetchError::UnknownKeyId(kid) => VerificationError::UnknownKeyId(kid),
            KeyFetchError::UpstreamUnavailable(msg) => VerificationError::UpstreamUnavailable(msg),
            KeyFetchError::Internal(msg) => VerificationError::Internal(msg),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for VerificationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        let detail = match err.kind() {
            ErrorKind::ExpiredSignature => "token has expired".to_string(),
            ErrorKind::ImmatureSignature => "token is not yet valid".to_string(),
            ErrorKind::InvalidSignature => "signature does not verify".to_string(),
            ErrorKind::InvalidIssuer => "issuer is not accepted".to_string(),
            ErrorKind::InvalidAudience => "audience is not accepted".to_string(),
            ErrorKind::InvalidAlgorithm => "algorithm does not match key".to_string(),
            ErrorKind::MissingRequiredClaim(claim) => format!("required claim `{claim}` is absent"),
            _ => format!("malformed token: {err}"),
        };
        VerificationError::InvalidToken(detail)
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// No token in the authorization header.
    MissingToken,
    /// The verifier rejected the token; the cause is logged, not returned.
    AuthenticationFailed(VerificationError),
    /// Token is valid but the identity is not in the directory.
    NotRegistered,
    /// Discovery or key fetch failed.
    UpstreamUnavailable(String),
    /// Unexpected failure inside the core.
    Internal(String),
}

impl DenialReason {
    /// Get the error code for this denial.
    pub fn error_code(&self) -> &'static str {
        match self {
            DenialReason::MissingToken => "missing_token",
            DenialReason::AuthenticationFailed(_) => "authentication_failed",
            DenialReason::NotRegistered => "not_registered",
            DenialReason::UpstreamUnavailable(_) => "upstream_unavailable",
            DenialReason::Internal(_) => "internal_error",
        }
    }

    /// Short caller-facing description.
    pub fn public_message(&self) -> &'static str {
        match self {
            DenialReason::MissingToken => "Missing authorization token",
            DenialReason::AuthenticationFailed(_) => "User not authenticated",
            DenialReason::NotRegistered => "User authenticated but not registered",
            DenialReason::UpstreamUnavailable(_) => "Identity provider unavailable",
            DenialReason::Internal(_) => "Internal server error",
        }
    }

    /// Get the HTTP status code for this denial.
    ///
    /// `not_registered` is the deployment's policy for authenticated but
    /// unregistered identities (401 or 403).
    pub fn status_code(&self, not_registered: StatusCode) -> StatusCode {
        match self {
            DenialReason::MissingToken | DenialReason::AuthenticationFailed(_) => {
                StatusCode::UNAUTHORIZED
            }
            DenialReason::NotRegistered => not_registered,
            DenialReason::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DenialReason::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::MissingToken => write!(f, "authorization token is missing"),
            DenialReason::AuthenticationFailed(cause) => write!(f, "authentication failed: {cause}"),
            DenialReason::NotRegistered => write!(f, "identity is not registered"),
            DenialReason::UpstreamUnavailable(msg) => write!(f, "upstream unavailable: {msg}"),
            DenialReason::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

/// JSON error body returned on denial.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthErrorBody {
    /// Short, non-sensitive description.
    pub error: String,
    /// Stable machine-readable code.
    pub error_code: String,
}

/// Axum rejection rendered from a [`DenialReason`].
#[derive(Debug)]
pub struct AuthRejection {
    pub status: StatusCode,
    pub reason: DenialReason,
}

impl AuthRejection {
    pub fn new(reason: DenialReason, not_registered: StatusCode) -> Self {
        Self {
            status: reason.status_code(not_registered),
            reason,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = Json(AuthErrorBody {
            error: self.reason.public_message().to_string(),
            error_code: self.reason.error_code().to_string(),
        });
        (self.status, body).into_response()
    }
}
