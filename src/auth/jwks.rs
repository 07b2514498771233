// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key cache backed by a provider's JWKS (optionally located through
//! an OIDC discovery document).
//!
//! ## Behaviour
//!
//! - Nothing is fetched until the first lookup (or an explicit [`warm_up`]).
//! - Cache hits read an [`ArcSwap`] snapshot and take no lock.
//! - A miss triggers one refresh. Concurrent misses share the same in-flight
//!   refresh and all observe its outcome.
//! - The refresh runs in its own tokio task, so a cancelled request does not
//!   cancel it and its result still lands in the cache.
//! - Entries are never expired by time. A rotated key shows up as a miss,
//!   which refreshes the set.
//! - The discovery document is fetched once; its `jwks_uri` is reused.
//!
//! [`warm_up`]: SigningKeyCache::warm_up

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::KeyFetchError;

/// Default upstream fetch timeout (10 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the key set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// OIDC discovery document whose `jwks_uri` points at the key set.
    Discovery(Url),
    /// Key set URL known up front.
    Jwks(Url),
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Discovery(url) => write!(f, "discovery:{url}"),
            KeySource::Jwks(url) => write!(f, "jwks:{url}"),
        }
    }
}

/// Cache tuning.
#[derive(Debug, Clone, Copy)]
pub struct KeyCacheOptions {
    /// Upper bound for one refresh (discovery + key set).
    pub fetch_timeout: Duration,
    /// Minimum time after a successful refresh before an unknown key id may
    /// trigger another one. Zero disables the cooldown.
    pub refresh_cooldown: Duration,
}

impl Default for KeyCacheOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            refresh_cooldown: Duration::ZERO,
        }
    }
}

/// A provider public key usable for signature verification.
pub struct SigningKey {
    key_id: String,
    algorithm: Algorithm,
    decoding_key: DecodingKey,
}

impl SigningKey {
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Algorithm this key is bound to.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

// Key material stays out of logs.
impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Immutable snapshot of the provider's keys.
#[derive(Debug, Default)]
struct KeySet {
    keys: HashMap<String, Arc<SigningKey>>,
    refreshed_at: Option<DateTime<Utc>>,
    refreshed_instant: Option<Instant>,
}

/// OIDC discovery document (only the fields used here).
#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: String,
}

/// JWKS body. Keys are parsed one by one so a single unsupported entry does
/// not poison the whole set.
#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<serde_json::Value>,
}

type RefreshOutcome = Result<Arc<KeySet>, KeyFetchError>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Shared, lazily populated signing key cache.
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct SigningKeyCache {
    inner: Arc<Inner>,
}

struct Inner {
    source: KeySource,
    client: reqwest::Client,
    options: KeyCacheOptions,
    keys: ArcSwap<KeySet>,
    jwks_uri: OnceCell<Url>,
    pending: Mutex<Option<PendingRefresh>>,
    refreshes: AtomicU64,
}

impl SigningKeyCache {
    pub fn new(source: KeySource) -> Self {
        Self::with_options(source, KeyCacheOptions::default())
    }

    pub fn with_options(source: KeySource, options: KeyCacheOptions) -> Self {
        let client = reqwest::Client::builder()
            .timeout(options.fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            inner: Arc::new(Inner {
                source,
                client,
                options,
                keys: ArcSwap::from_pointee(KeySet::default()),
                jwks_uri: OnceCell::new(),
                pending: Mutex::new(None),
                refreshes: AtomicU64::new(0),
            }),
        }
    }

    /// Get the signing key for `kid`, refreshing once on a miss.
    ///
    /// # Errors
    ///
    /// - [`KeyFetchError::UnknownKeyId`] if the key set was fetched but has no such key
    /// - [`KeyFetchError::UpstreamUnavailable`] if the refresh failed or timed out
    #[instrument(skip(self), fields(source = %self.inner.source))]
    pub async fn get_key(&self, kid: &str) -> Result<Arc<SigningKey>, KeyFetchError> {
        if let Some(key) = self.inner.keys.load().keys.get(kid) {
            return Ok(Arc::clone(key));
        }

        debug!(kid = %kid, "Signing key cache miss");
        let keys = self.refresh_for(kid).await?;

        keys.keys.get(kid).cloned().ok_or_else(|| {
            warn!(kid = %kid, key_count = keys.keys.len(), "Key id not found after refresh");
            KeyFetchError::UnknownKeyId(kid.to_string())
        })
    }

    /// Refresh now (or join an in-flight refresh). Returns the number of keys.
    pub async fn warm_up(&self) -> Result<usize, KeyFetchError> {
        let pending = {
            let mut slot = self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
            self.join_or_start(&mut slot)
        };
        Ok(pending.await?.keys.len())
    }

    /// Whether at least one refresh has succeeded.
    pub fn is_warm(&self) -> bool {
        self.inner.keys.load().refreshed_at.is_some()
    }

    pub fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.inner.keys.load().refreshed_at
    }

    /// Number of refresh attempts made so far (successful or not).
    pub fn refresh_count(&self) -> u64 {
        self.inner.refreshes.load(Ordering::Relaxed)
    }

    /// Sorted ids of the cached keys.
    pub fn cached_key_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.keys.load().keys.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn refresh_for(&self, kid: &str) -> RefreshOutcome {
        let pending = {
            let mut slot = self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner);

            // A refresh may have finished between the miss and taking the lock.
            let current = self.inner.keys.load_full();
            if current.keys.contains_key(kid) {
                return Ok(current);
            }
            if slot.is_none() && self.inner.in_cooldown(&current) {
                debug!(kid = %kid, "Refresh skipped, cooldown active");
                return Ok(current);
            }
            self.join_or_start(&mut slot)
        };
        pending.await
    }

    fn join_or_start(&self, slot: &mut Option<PendingRefresh>) -> PendingRefresh {
        if let Some(pending) = slot.as_ref() {
            return pending.clone();
        }
        let pending = Inner::spawn_refresh(Arc::clone(&self.inner));
        *slot = Some(pending.clone());
        pending
    }
}

impl Inner {
    fn in_cooldown(&self, current: &KeySet) -> bool {
        let cooldown = self.options.refresh_cooldown;
        !cooldown.is_zero()
            && current
                .refreshed_instant
                .is_some_and(|at| at.elapsed() < cooldown)
    }

    /// Start a detached refresh. The caller must hold the `pending` lock and
    /// store the returned future in it.
    fn spawn_refresh(inner: Arc<Inner>) -> PendingRefresh {
        let task = tokio::spawn(async move {
            let timeout = inner.options.fetch_timeout;
            let outcome = match tokio::time::timeout(timeout, inner.fetch_key_set()).await {
                Ok(result) => result.map(Arc::new),
                Err(_) => Err(KeyFetchError::UpstreamUnavailable(format!(
                    "key refresh timed out after {}ms",
                    timeout.as_millis()
                ))),
            };

            match &outcome {
                Ok(set) => {
                    inner.keys.store(Arc::clone(set));
                    info!(source = %inner.source, key_count = set.keys.len(), "Signing keys refreshed");
                }
                Err(e) => warn!(source = %inner.source, error = %e, "Signing key refresh failed"),
            }
            inner.refreshes.fetch_add(1, Ordering::Relaxed);
            *inner.pending.lock().unwrap_or_else(PoisonError::into_inner) = None;
            outcome
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(KeyFetchError::Internal(format!("key refresh task failed: {e}")))
            })
        }
        .boxed()
        .shared()
    }

    async fn fetch_key_set(&self) -> Result<KeySet, KeyFetchError> {
        let jwks_uri = self.jwks_uri().await?;
        let document: JwksDocument = self.get_json(&jwks_uri).await?;

        let mut keys = HashMap::new();
        for value in document.keys {
            match parse_signing_key(value) {
                Ok(key) => {
                    keys.insert(key.key_id.clone(), Arc::new(key));
                }
                Err(reason) => debug!(%reason, "Skipping unusable JWK"),
            }
        }
        if keys.is_empty() {
            warn!(jwks_uri = %jwks_uri, "Key set contains no usable signing keys");
        }

        Ok(KeySet {
            keys,
            refreshed_at: Some(Utc::now()),
            refreshed_instant: Some(Instant::now()),
        })
    }

    async fn jwks_uri(&self) -> Result<Url, KeyFetchError> {
        match &self.source {
            KeySource::Jwks(url) => Ok(url.clone()),
            KeySource::Discovery(url) => self
                .jwks_uri
                .get_or_try_init(|| async {
                    let document: DiscoveryDocument = self.get_json(url).await?;
                    let jwks_uri = Url::parse(&document.jwks_uri).map_err(|e| {
                        KeyFetchError::UpstreamUnavailable(format!(
                            "discovery document has an invalid jwks_uri: {e}"
                        ))
                    })?;
                    info!(jwks_uri = %jwks_uri, "Discovered signing key endpoint");
                    Ok::<Url, KeyFetchError>(jwks_uri)
                })
                .await
                .cloned(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, KeyFetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| KeyFetchError::UpstreamUnavailable(format!("GET {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(KeyFetchError::UpstreamUnavailable(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        response.json::<T>().await.map_err(|e| {
            KeyFetchError::UpstreamUnavailable(format!("malformed response from {url}: {e}"))
        })
    }
}

/// Turn one JWKS entry into a signing key, or explain why it is unusable.
fn parse_signing_key(value: serde_json::Value) -> Result<SigningKey, String> {
    let jwk: Jwk = serde_json::from_value(value).map_err(|e| format!("unrecognised JWK: {e}"))?;
    let key_id = jwk
        .common
        .key_id
        .clone()
        .ok_or_else(|| "JWK has no kid".to_string())?;

    if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
        return Err(format!("JWK {key_id} is an encryption key"));
    }

    let (decoding_key, algorithm) =
        jwk_to_decoding_key(&jwk).map_err(|reason| format!("JWK {key_id}: {reason}"))?;

    Ok(SigningKey {
        key_id,
        algorithm,
        decoding_key,
    })
}

/// Convert an RSA JWK to a DecodingKey and the algorithm it is bound to.
///
/// A JWK without `alg` binds to RS256. EC and symmetric keys are refused,
/// since only RSA signatures are ever accepted.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), String> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let alg = match jwk.common.key_algorithm {
                None | Some(KeyAlgorithm::RS256) => Algorithm::RS256,
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(other) => return Err(format!("unsupported RSA algorithm {other:?}")),
            };
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| format!("invalid RSA key: {e}"))?;
            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(_) => Err("EC keys are not accepted".to_string()),
        _ => Err("unsupported key type".to_string()),
    }
}
