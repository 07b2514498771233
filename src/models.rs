// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Directory Data Models
//!
//! - [`ProfileRecord`]: one entry of the directory file, as stored
//! - [`RegisteredUser`]: a directory entry bound to its identity key
//! - [`ProfileResponse`]: the JSON body returned by the dashboard endpoint

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A profile as it appears in the directory file, keyed externally by identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileRecord {
    pub username: String,
    pub address: String,
    pub phone: String,
}

/// A registered account.
///
/// Immutable once loaded; owned by the directory and cloned out on a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredUser {
    /// Email or UPN the account is registered under.
    pub identity_key: String,
    pub display_name: String,
    pub address: String,
    pub phone: String,
}

impl RegisteredUser {
    pub fn from_record(identity_key: impl Into<String>, record: ProfileRecord) -> Self {
        Self {
            identity_key: identity_key.into(),
            display_name: record.username,
            address: record.address,
            phone: record.phone,
        }
    }
}

/// Response for GET /api/dashboard
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ProfileResponse {
    /// Display name of the registered account.
    pub username: String,
    /// Postal address.
    pub address: String,
    /// Contact phone number.
    pub phone: String,
}

impl From<RegisteredUser> for ProfileResponse {
    fn from(user: RegisteredUser) -> Self {
        Self {
            username: user.display_name,
            address: user.address,
            phone: user.phone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_omits_identity_key() {
        let user = RegisteredUser::from_record(
            "user3@example.com",
            ProfileRecord {
                username: "User3".into(),
                address: "300 Third St, CityC".into(),
                phone: "333-333-3333".into(),
            },
        );

        let json = serde_json::to_string(&ProfileResponse::from(user)).unwrap();
        assert_eq!(
            json,
            r#"{"username":"User3","address":"300 Third St, CityC","phone":"333-333-3333"}"#
        );
    }
}
