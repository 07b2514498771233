// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for registered users.
//!
//! Use the `Registered` extractor in handlers to require a verified token
//! whose identity is in the directory:
//!
//! ```rust,ignore
//! async fn my_handler(Registered(user): Registered) -> impl IntoResponse {
//!     // user is RegisteredUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::engine::AuthorizationDecision;
use super::error::{AuthRejection, DenialReason, VerificationError};
use crate::models::RegisteredUser;
use crate::state::AppState;

/// Extractor for authenticated, registered users.
///
/// Rejections render as JSON `{error, error_code}` with the status from
/// [`DenialReason::status_code`].
pub struct Registered(pub RegisteredUser);

impl FromRequestParts<AppState> for Registered {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already authorized earlier in this request
        if let Some(user) = parts.extensions.get::<RegisteredUser>().cloned() {
            return Ok(Registered(user));
        }

        let reject = |reason| AuthRejection::new(reason, state.not_registered_status);

        let header = match parts.headers.get(AUTHORIZATION) {
            None => None,
            Some(value) => Some(value.to_str().map_err(|_| {
                reject(DenialReason::AuthenticationFailed(VerificationError::InvalidToken(
                    "authorization header is not visible ASCII".to_string(),
                )))
            })?),
        };

        match state.authorizer.authorize(header).await {
            AuthorizationDecision::Authorized(user) => {
                parts.extensions.insert(user.clone());
                Ok(Registered(user))
            }
            AuthorizationDecision::Denied(reason) => Err(reject(reason)),
        }
    }
}
