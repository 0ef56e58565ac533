//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::{
    AppState,
    middleware::{AuthUser, auth::auth_middleware},
};
use vidya_core::fees::{DiscountPolicy, FeeError, types as core};

pub mod class_fees;
pub mod fee_components;
pub mod health;
pub mod reports;
pub mod student_fees;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(fee_components::routes())
        .merge(class_fees::routes())
        .merge(student_fees::routes())
        .merge(reports::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Translates a fee engine error into a JSON error response.
pub(crate) fn fee_error_response(err: &FeeError) -> Response {
    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, "fee operation failed");
    }
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

/// Rejects non-admin callers; catalog and template writes are admin-only.
pub(crate) fn require_admin(auth: &AuthUser) -> Result<(), Response> {
    if auth.is_admin_tier() {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Admin role required"
            })),
        )
            .into_response())
    }
}

/// Maps the caller's claims onto the fee engine's authorization tier.
pub(crate) fn role_tier(auth: &AuthUser) -> core::RoleTier {
    if auth.is_admin_tier() {
        core::RoleTier::Admin
    } else {
        core::RoleTier::Staff
    }
}

/// Builds the discount policy from the configured threshold.
pub(crate) fn discount_policy(state: &AppState) -> DiscountPolicy {
    DiscountPolicy {
        elevation_threshold_percent: state.fees.discount_elevation_threshold_percent,
    }
}
