// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::Json;

use crate::auth::error::AuthErrorBody;
use crate::auth::Registered;
use crate::models::ProfileResponse;

/// Get the caller's registered profile.
///
/// Requires `Authorization: Bearer <token>` from the configured identity
/// provider. The token's identity must be in the directory.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Registered profile", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token", body = AuthErrorBody),
        (status = 403, description = "Authenticated but not registered (when configured)", body = AuthErrorBody),
        (status = 503, description = "Identity provider unavailable", body = AuthErrorBody),
        (status = 500, description = "Internal error", body = AuthErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn dashboard(Registered(user): Registered) -> Json<ProfileResponse> {
    Json(user.into())
}
