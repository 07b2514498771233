// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registered-user directory.
//!
//! The directory is loaded once at startup and is read-only afterwards. It is
//! passed to the authorization engine as an injected value, never a global.
//!
//! ## File format
//!
//! ```json
//! {
//!   "user3@example.com": {
//!     "username": "User3",
//!     "address": "300 Third St, CityC",
//!     "phone": "333-333-3333"
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::models::{ProfileRecord, RegisteredUser};

/// How subject identities are compared with directory keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Byte-for-byte comparison.
    #[default]
    Exact,
    /// Keys and lookups are lowercased before comparison.
    CaseInsensitive,
}

impl MatchPolicy {
    fn normalize<'a>(&self, identity: &'a str) -> std::borrow::Cow<'a, str> {
        match self {
            MatchPolicy::Exact => std::borrow::Cow::Borrowed(identity),
            MatchPolicy::CaseInsensitive => std::borrow::Cow::Owned(identity.to_lowercase()),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(MatchPolicy::Exact),
            "case-insensitive" | "case_insensitive" => Ok(MatchPolicy::CaseInsensitive),
            other => Err(format!("unknown directory match policy `{other}`")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to read directory file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("directory is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("identity `{0}` appears more than once under the configured match policy")]
    DuplicateIdentity(String),
}

/// Immutable identity → profile lookup table.
#[derive(Debug, Default)]
pub struct Directory {
    entries: HashMap<String, RegisteredUser>,
    policy: MatchPolicy,
}

impl Directory {
    /// Build a directory from `(identity, profile)` pairs.
    pub fn new(
        records: impl IntoIterator<Item = (String, ProfileRecord)>,
        policy: MatchPolicy,
    ) -> Result<Self, DirectoryError> {
        let mut entries = HashMap::new();
        for (identity, record) in records {
            let key = policy.normalize(&identity).into_owned();
            if entries.contains_key(&key) {
                return Err(DirectoryError::DuplicateIdentity(identity));
            }
            entries.insert(key, RegisteredUser::from_record(identity, record));
        }
        Ok(Self { entries, policy })
    }

    pub fn from_json_str(json: &str, policy: MatchPolicy) -> Result<Self, DirectoryError> {
        // Ordered map so duplicate detection is deterministic.
        let records: std::collections::BTreeMap<String, ProfileRecord> = serde_json::from_str(json)?;
        Self::new(records, policy)
    }

    pub fn from_json_file(path: impl AsRef<Path>, policy: MatchPolicy) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json, policy)
    }

    /// Look up a verified subject identity.
    pub fn resolve(&self, identity: &str) -> Option<&RegisteredUser> {
        self.entries.get(self.policy.normalize(identity).as_ref())
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
