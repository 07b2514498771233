// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! typed [`Settings`] parsed from them once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `AUTH_PROVIDER` | Active verifier: `google` or `entra` | Required |
//! | `GOOGLE_CLIENT_ID` | Expected audience of Google ID tokens | Required for `google` |
//! | `GOOGLE_JWKS_URL` | Google signing keys | `https://www.googleapis.com/oauth2/v3/certs` |
//! | `ENTRA_TENANT_ID` | Entra tenant | Required for `entra` |
//! | `ENTRA_CLIENT_ID` | Expected audience of Entra tokens | Required for `entra` |
//! | `ENTRA_DISCOVERY_URL` | Discovery URL template (`{tenant}` placeholder) | Microsoft v2.0 endpoint |
//! | `ENTRA_ISSUER` | Expected Entra issuer | Unset (not checked) |
//! | `DIRECTORY_FILE` | JSON file of registered users | Required |
//! | `DIRECTORY_MATCH` | `exact` or `case-insensitive` | `exact` |
//! | `NOT_REGISTERED_STATUS` | Status for authenticated but unregistered users (`401`/`403`) | `403` |
//! | `UPSTREAM_TIMEOUT_SECS` | Discovery/JWKS fetch timeout | `10` |
//! | `TOKEN_LEEWAY_SECS` | Clock skew tolerance | `60` |
//! | `JWKS_REFRESH_COOLDOWN_SECS` | Minimum gap between miss-triggered refreshes | `0` |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated origins | Unset (permissive) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::StatusCode;

use crate::auth::verifier::DEFAULT_LEEWAY_SECS;
use crate::directory::MatchPolicy;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const AUTH_PROVIDER_ENV: &str = "AUTH_PROVIDER";
pub const GOOGLE_CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
pub const GOOGLE_JWKS_URL_ENV: &str = "GOOGLE_JWKS_URL";
pub const ENTRA_TENANT_ID_ENV: &str = "ENTRA_TENANT_ID";
pub const ENTRA_CLIENT_ID_ENV: &str = "ENTRA_CLIENT_ID";
pub const ENTRA_DISCOVERY_URL_ENV: &str = "ENTRA_DISCOVERY_URL";
pub const ENTRA_ISSUER_ENV: &str = "ENTRA_ISSUER";
pub const DIRECTORY_FILE_ENV: &str = "DIRECTORY_FILE";
pub const DIRECTORY_MATCH_ENV: &str = "DIRECTORY_MATCH";
pub const NOT_REGISTERED_STATUS_ENV: &str = "NOT_REGISTERED_STATUS";
pub const UPSTREAM_TIMEOUT_SECS_ENV: &str = "UPSTREAM_TIMEOUT_SECS";
pub const TOKEN_LEEWAY_SECS_ENV: &str = "TOKEN_LEEWAY_SECS";
pub const JWKS_REFRESH_COOLDOWN_SECS_ENV: &str = "JWKS_REFRESH_COOLDOWN_SECS";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const DEFAULT_ENTRA_DISCOVERY_URL: &str =
    "https://login.microsoftonline.com/{tenant}/v2.0/.well-known/openid-configuration";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Identity provider families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Audience-bound Google ID tokens.
    Google,
    /// Microsoft Entra ID tokens, keys located via OIDC discovery.
    Entra,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "entra" | "entraid" | "microsoft" => Ok(ProviderKind::Entra),
            _ => Err(ConfigError::Invalid {
                var: AUTH_PROVIDER_ENV,
                reason: format!("unknown provider `{s}`"),
            }),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Google => write!(f, "google"),
            ProviderKind::Entra => write!(f, "entra"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Google verifier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleSettings {
    pub client_id: String,
    pub jwks_url: url::Url,
}

/// Entra verifier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntraSettings {
    pub tenant_id: String,
    pub client_id: String,
    /// Discovery URL with the tenant already substituted.
    pub discovery_url: url::Url,
    pub issuer: Option<String>,
}

/// Settings of the configured provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSettings {
    Google(GoogleSettings),
    Entra(EntraSettings),
}

impl ProviderSettings {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderSettings::Google(_) => ProviderKind::Google,
            ProviderSettings::Entra(_) => ProviderKind::Entra,
        }
    }
}

/// Verification settings shared by all providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub provider: ProviderSettings,
    pub upstream_timeout: Duration,
    pub leeway_secs: u64,
    pub refresh_cooldown: Duration,
    /// Status for authenticated identities missing from the directory.
    pub not_registered_status: StatusCode,
}

/// Complete process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub auth: AuthSettings,
    pub directory_file: PathBuf,
    pub directory_match: MatchPolicy,
    /// `None` means permissive CORS.
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Settings {
    /// Load from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to read variables. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let provider_kind: ProviderKind = require(AUTH_PROVIDER_ENV)?.parse()?;
        let provider = match provider_kind {
            ProviderKind::Google => ProviderSettings::Google(GoogleSettings {
                client_id: require(GOOGLE_CLIENT_ID_ENV)?,
                jwks_url: parse_url(
                    GOOGLE_JWKS_URL_ENV,
                    &get(GOOGLE_JWKS_URL_ENV).unwrap_or_else(|| DEFAULT_GOOGLE_JWKS_URL.to_string()),
                )?,
            }),
            ProviderKind::Entra => {
                let tenant_id = require(ENTRA_TENANT_ID_ENV)?;
                let template = get(ENTRA_DISCOVERY_URL_ENV)
                    .unwrap_or_else(|| DEFAULT_ENTRA_DISCOVERY_URL.to_string());
                ProviderSettings::Entra(EntraSettings {
                    discovery_url: discovery_url(&template, &tenant_id)?,
                    tenant_id,
                    client_id: require(ENTRA_CLIENT_ID_ENV)?,
                    issuer: get(ENTRA_ISSUER_ENV),
                })
            }
        };

        let not_registered_status = match get(NOT_REGISTERED_STATUS_ENV).as_deref() {
            None | Some("403") => StatusCode::FORBIDDEN,
            Some("401") => StatusCode::UNAUTHORIZED,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: NOT_REGISTERED_STATUS_ENV,
                    reason: format!("expected 401 or 403, got `{other}`"),
                })
            }
        };

        let directory_match = match get(DIRECTORY_MATCH_ENV) {
            Some(value) => value.parse::<MatchPolicy>().map_err(|reason| ConfigError::Invalid {
                var: DIRECTORY_MATCH_ENV,
                reason,
            })?,
            None => MatchPolicy::default(),
        };

        let cors_allowed_origins = get(CORS_ALLOWED_ORIGINS_ENV).map(|value| {
            value
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect()
        });

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_number(PORT_ENV, get(PORT_ENV), DEFAULT_PORT)?,
            auth: AuthSettings {
                provider,
                upstream_timeout: Duration::from_secs(parse_number(
                    UPSTREAM_TIMEOUT_SECS_ENV,
                    get(UPSTREAM_TIMEOUT_SECS_ENV),
                    DEFAULT_UPSTREAM_TIMEOUT_SECS,
                )?),
                leeway_secs: parse_number(
                    TOKEN_LEEWAY_SECS_ENV,
                    get(TOKEN_LEEWAY_SECS_ENV),
                    DEFAULT_LEEWAY_SECS,
                )?,
                refresh_cooldown: Duration::from_secs(parse_number(
                    JWKS_REFRESH_COOLDOWN_SECS_ENV,
                    get(JWKS_REFRESH_COOLDOWN_SECS_ENV),
                    0,
                )?),
                not_registered_status,
            },
            directory_file: PathBuf::from(require(DIRECTORY_FILE_ENV)?),
            directory_match,
            cors_allowed_origins,
        })
    }
}

fn parse_url(var: &'static str, value: &str) -> Result<url::Url, ConfigError> {
    url::Url::parse(value).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

/// Substitute the tenant into a discovery URL template.
pub fn discovery_url(template: &str, tenant_id: &str) -> Result<url::Url, ConfigError> {
    if !template.contains("{tenant}") {
        return Err(ConfigError::Invalid {
            var: ENTRA_DISCOVERY_URL_ENV,
            reason: "template has no {tenant} placeholder".to_string(),
        });
    }
    parse_url(ENTRA_DISCOVERY_URL_ENV, &template.replace("{tenant}", tenant_id))
}

fn parse_number<T: FromStr>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}
