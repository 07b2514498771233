// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-level errors: anything that stops the server from starting or
//! keeps it from serving. Request-level denials live in [`crate::auth::error`].

use crate::config::ConfigError;
use crate::directory::DirectoryError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("invalid bind address `{addr}`: {source}")]
    BindAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
