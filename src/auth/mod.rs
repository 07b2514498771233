// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token verification and authorization against the user directory.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <token>` (or the bare token)
//! 2. Server:
//!    - Verifies the token with the configured provider's verifier
//!      (Google ID token or Microsoft Entra)
//!    - Fetches provider signing keys over HTTP, lazily, with single-flight
//!      refresh on an unknown key id
//!    - Extracts the subject identity (`email`, or `preferred_username`/`upn`)
//! 3. The identity is looked up in the directory; a match returns the profile
//!
//! ## Security
//!
//! - Only asymmetric algorithms are accepted and must match the key's algorithm
//! - Denial bodies never carry the verification detail
//! - Raw tokens are never logged
//! - Clock skew tolerance defaults to 60 seconds

pub mod claims;
pub mod engine;
pub mod entra;
pub mod error;
pub mod extractor;
pub mod google;
pub mod jwks;
pub mod registry;
pub mod verifier;

pub use claims::VerifiedClaims;
pub use engine::{extract_token, AuthorizationDecision, Authorizer};
pub use entra::EntraIdVerifier;
pub use error::{AuthRejection, DenialReason, KeyFetchError, VerificationError};
pub use extractor::Registered;
pub use google::GoogleIdTokenVerifier;
pub use jwks::{KeyCacheOptions, KeySource, SigningKey, SigningKeyCache};
pub use registry::VerifierRegistry;
pub use verifier::TokenVerifier;
