// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, warn};

use idgate_server::{
    api::router,
    auth::{Authorizer, VerifierRegistry},
    config::Settings,
    directory::Directory,
    error::ServerError,
    state::AppState,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    telemetry::init_tracing();

    let settings = Settings::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;
    info!(
        provider = %settings.auth.provider.kind(),
        directory_file = %settings.directory_file.display(),
        "Configuration loaded"
    );

    let directory = Directory::from_json_file(&settings.directory_file, settings.directory_match)
        .map_err(|e| {
            error!(error = %e, "Failed to load directory");
            e
        })?;
    if directory.is_empty() {
        warn!(path = %settings.directory_file.display(), "Directory has no registered users");
    }
    info!(
        entries = directory.len(),
        policy = ?directory.policy(),
        "Directory loaded"
    );

    let verifiers = VerifierRegistry::from_settings(&settings.auth);
    let authorizer = Authorizer::new(verifiers, Arc::new(directory));
    let state = AppState::new(authorizer, settings.auth.not_registered_status);

    // Keys are fetched lazily on first use as well; this only shortens the
    // first request. Failure is not fatal.
    let verifier = Arc::clone(state.authorizer.verifiers().active());
    tokio::spawn(async move {
        match verifier.warm_up().await {
            Ok(count) => info!(provider = %verifier.provider(), keys = count, "Signing keys warmed up"),
            Err(e) => warn!(provider = %verifier.provider(), error = %e, "Signing key warm-up failed"),
        }
    });

    let app = router(state, settings.cors_allowed_origins.as_deref());

    let bind = format!("{}:{}", settings.host, settings.port);
    let addr: SocketAddr = bind
        .parse()
        .map_err(|source| ServerError::BindAddress { addr: bind.clone(), source })?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "idgate listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, shutting down"),
            Err(e) => error!(error = %e, "Failed to listen for SIGINT"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
