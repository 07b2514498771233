// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verifier registry: holds the verifiers a deployment is configured with and
//! selects the one that handles requests.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::entra::EntraIdVerifier;
use super::google::GoogleIdTokenVerifier;
use super::jwks::KeyCacheOptions;
use super::verifier::TokenVerifier;
use crate::config::{AuthSettings, ConfigError, ProviderKind, ProviderSettings, AUTH_PROVIDER_ENV};

/// Registered verifiers, at most one per provider family, plus the active one.
pub struct VerifierRegistry {
    verifiers: HashMap<ProviderKind, Arc<dyn TokenVerifier>>,
    active: Arc<dyn TokenVerifier>,
}

impl VerifierRegistry {
    /// Registry whose only (and active) verifier is `verifier`.
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        let mut verifiers = HashMap::new();
        verifiers.insert(verifier.provider(), Arc::clone(&verifier));
        Self {
            verifiers,
            active: verifier,
        }
    }

    /// Build the verifier for the configured provider.
    pub fn from_settings(settings: &AuthSettings) -> Self {
        let options = KeyCacheOptions {
            fetch_timeout: settings.upstream_timeout,
            refresh_cooldown: settings.refresh_cooldown,
        };
        let verifier: Arc<dyn TokenVerifier> = match &settings.provider {
            ProviderSettings::Google(google) => Arc::new(GoogleIdTokenVerifier::from_settings(
                google,
                options,
                settings.leeway_secs,
            )),
            ProviderSettings::Entra(entra) => Arc::new(EntraIdVerifier::from_settings(
                entra,
                options,
                settings.leeway_secs,
            )),
        };
        info!(provider = %verifier.provider(), "Token verifier configured");
        Self::new(verifier)
    }

    /// Add or replace the verifier for its provider. Replacing the active
    /// provider's verifier makes the new one active.
    pub fn register(&mut self, verifier: Arc<dyn TokenVerifier>) {
        if verifier.provider() == self.active.provider() {
            self.active = Arc::clone(&verifier);
        }
        self.verifiers.insert(verifier.provider(), verifier);
    }

    /// Make `kind` the active provider.
    pub fn activate(&mut self, kind: ProviderKind) -> Result<(), ConfigError> {
        let verifier = self.verifiers.get(&kind).ok_or_else(|| ConfigError::Invalid {
            var: AUTH_PROVIDER_ENV,
            reason: format!("no verifier registered for `{kind}`"),
        })?;
        self.active = Arc::clone(verifier);
        Ok(())
    }

    pub fn active_kind(&self) -> ProviderKind {
        self.active.provider()
    }

    /// The verifier every request is checked with.
    pub fn active(&self) -> &Arc<dyn TokenVerifier> {
        &self.active
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn TokenVerifier>> {
        self.verifiers.get(&kind)
    }
}
