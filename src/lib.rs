// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! idgate - bearer token relying party.
//!
//! Verifies tokens issued by Google or Microsoft Entra ID and resolves the
//! verified identity against a registered-user directory.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token verification, signing key cache and authorization engine
//! - `directory` - Registered-user lookup table
//! - `config` - Environment-driven settings

pub mod api;
pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod state;
pub mod telemetry;

#[cfg(test)]
mod testing;
