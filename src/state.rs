// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::http::StatusCode;

use crate::auth::Authorizer;

#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<Authorizer>,
    /// Status returned for authenticated identities missing from the directory.
    pub not_registered_status: StatusCode,
}

impl AppState {
    pub fn new(authorizer: Authorizer, not_registered_status: StatusCode) -> Self {
        Self {
            authorizer: Arc::new(authorizer),
            not_registered_status,
        }
    }
}
