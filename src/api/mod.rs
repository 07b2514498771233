// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::error::AuthErrorBody,
    models::ProfileResponse,
    state::AppState,
};

pub mod dashboard;
pub mod health;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the application router.
///
/// `cors_allowed_origins` of `None` allows any origin (without credentials).
pub fn router(state: AppState, cors_allowed_origins: Option<&[String]>) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/api/dashboard", get(dashboard::dashboard))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(TraceLayer::new_for_http()),
        )
        .layer(cors_layer(cors_allowed_origins))
}

/// CORS policy: exact-match allowlist when origins are configured, any
/// origin when unset or `*`. Credentials are never allowed.
fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let cors = match allowed_origins {
        Some(origins) if !origins.iter().any(|o| o == "*") => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|s| HeaderValue::from_str(s).ok())
                .collect();
            CorsLayer::new().allow_origin(AllowOrigin::list(allowed))
        }
        _ => CorsLayer::new().allow_origin(Any),
    };

    cors.allow_methods([Method::GET, Method::OPTIONS]).allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        HeaderName::from_static(REQUEST_ID_HEADER),
    ])
}

/// Registers the bearer token scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        dashboard::dashboard,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            ProfileResponse,
            AuthErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Dashboard", description = "Registered profile lookup"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
