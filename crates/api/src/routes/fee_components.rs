//! Fee component catalog routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use vidya_core::fees::types as core;
use vidya_db::entities::fee_components;
use vidya_db::repositories::fee_component::{
    CreateFeeComponentInput, FeeComponentRepository, UpdateFeeComponentInput,
};

use super::{fee_error_response, require_admin};

/// Creates the fee component routes (auth middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fee-components", post(create_fee_component))
        .route("/fee-components", get(list_fee_components))
        .route("/fee-components/{component_id}", get(get_fee_component))
        .route("/fee-components/{component_id}", put(update_fee_component))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a fee component.
#[derive(Debug, Deserialize)]
pub struct CreateFeeComponentRequest {
    /// Display name.
    pub name: String,
    /// Short code, unique per tenant.
    pub code: String,
    /// Optional description.
    pub description: Option<String>,
    /// Component category.
    pub category: core::FeeComponentCategory,
    /// Whether discounts may be granted against this component.
    pub allow_discount: bool,
    /// Default mandatory flag for new template rows.
    pub is_mandatory_default: bool,
}

/// Request body for partially updating a fee component.
#[derive(Debug, Deserialize)]
pub struct UpdateFeeComponentRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub category: Option<core::FeeComponentCategory>,
    /// New discountability flag.
    pub allow_discount: Option<bool>,
    /// New default mandatory flag.
    pub is_mandatory_default: Option<bool>,
    /// New active flag (false = soft delete).
    pub is_active: Option<bool>,
}

/// Query parameters for listing fee components.
#[derive(Debug, Deserialize)]
pub struct ListFeeComponentsQuery {
    /// Restrict to active components (default true).
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

fn default_active_only() -> bool {
    true
}

/// Response for a fee component.
#[derive(Debug, Serialize)]
pub struct FeeComponentResponse {
    /// Component ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Code.
    pub code: String,
    /// Description.
    pub description: Option<String>,
    /// Category.
    pub category: core::FeeComponentCategory,
    /// Whether discounts are allowed.
    pub allow_discount: bool,
    /// Default mandatory flag.
    pub is_mandatory_default: bool,
    /// Active flag.
    pub is_active: bool,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<fee_components::Model> for FeeComponentResponse {
    fn from(model: fee_components::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            description: model.description,
            category: core::FeeComponentCategory::from(model.category),
            allow_discount: model.allow_discount,
            is_mandatory_default: model.is_mandatory_default,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/fee-components` - Create a fee component.
async fn create_fee_component(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateFeeComponentRequest>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let repo = FeeComponentRepository::new((*state.db).clone());
    let input = CreateFeeComponentInput {
        name: payload.name,
        code: payload.code,
        description: payload.description,
        category: payload.category,
        allow_discount: payload.allow_discount,
        is_mandatory_default: payload.is_mandatory_default,
    };

    match repo.create(auth.tenant_id(), input).await {
        Ok(component) => (
            StatusCode::CREATED,
            Json(FeeComponentResponse::from(component)),
        )
            .into_response(),
        Err(e) => fee_error_response(&e),
    }
}

/// GET `/fee-components` - List the tenant's fee components.
async fn list_fee_components(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListFeeComponentsQuery>,
) -> impl IntoResponse {
    let repo = FeeComponentRepository::new((*state.db).clone());

    match repo.list(auth.tenant_id(), query.active_only).await {
        Ok(components) => {
            let response: Vec<FeeComponentResponse> = components
                .into_iter()
                .map(FeeComponentResponse::from)
                .collect();
            Json(response).into_response()
        }
        Err(e) => fee_error_response(&e),
    }
}

/// GET `/fee-components/{component_id}` - Get one fee component.
async fn get_fee_component(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(component_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = FeeComponentRepository::new((*state.db).clone());

    match repo.get(auth.tenant_id(), component_id).await {
        Ok(component) => Json(FeeComponentResponse::from(component)).into_response(),
        Err(e) => fee_error_response(&e),
    }
}

/// PUT `/fee-components/{component_id}` - Partially update a fee component.
async fn update_fee_component(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(component_id): Path<Uuid>,
    Json(payload): Json<UpdateFeeComponentRequest>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let repo = FeeComponentRepository::new((*state.db).clone());
    let input = UpdateFeeComponentInput {
        name: payload.name,
        description: payload.description.map(Some),
        category: payload.category,
        allow_discount: payload.allow_discount,
        is_mandatory_default: payload.is_mandatory_default,
        is_active: payload.is_active,
    };

    match repo.update(auth.tenant_id(), component_id, input).await {
        Ok(component) => Json(FeeComponentResponse::from(component)).into_response(),
        Err(e) => fee_error_response(&e),
    }
}
