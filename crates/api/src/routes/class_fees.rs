//! Class fee template routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use vidya_core::fees::types as core;
use vidya_db::entities::class_fee_structures;
use vidya_db::repositories::class_fee::{
    ClassFeeRepository, ClassFeesByClass, CreateClassFeeInput,
};

use super::{fee_error_response, require_admin};

/// Creates the class fee template routes (auth middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/class-fees", post(create_class_fee))
        .route("/class-fees", get(list_class_fees))
        .route("/class-fees/by-class", get(list_class_fees_by_class))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a class fee template row.
#[derive(Debug, Deserialize)]
pub struct CreateClassFeeRequest {
    /// Academic year.
    pub academic_year_id: Uuid,
    /// Class.
    pub class_id: Uuid,
    /// Fee component.
    pub fee_component_id: Uuid,
    /// Charge amount.
    pub amount: Decimal,
    /// Billing frequency.
    pub frequency: core::FeeFrequency,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Whether every enrolled student is auto-assigned this charge.
    pub is_mandatory: bool,
}

/// Query parameters for listing template rows.
#[derive(Debug, Deserialize)]
pub struct ListClassFeesQuery {
    /// Academic year to list for.
    pub academic_year_id: Uuid,
    /// Optional class scope.
    pub class_id: Option<Uuid>,
}

/// Query parameters for the grouped listing.
#[derive(Debug, Deserialize)]
pub struct GroupedClassFeesQuery {
    /// Academic year to list for.
    pub academic_year_id: Uuid,
    /// Restrict to active rows and components (default true).
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

fn default_active_only() -> bool {
    true
}

/// Response for a class fee template row.
#[derive(Debug, Serialize)]
pub struct ClassFeeResponse {
    /// Template row ID.
    pub id: Uuid,
    /// Academic year.
    pub academic_year_id: Uuid,
    /// Class.
    pub class_id: Uuid,
    /// Fee component.
    pub fee_component_id: Uuid,
    /// Charge amount.
    pub amount: String,
    /// Billing frequency.
    pub frequency: core::FeeFrequency,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Mandatory flag.
    pub is_mandatory: bool,
    /// Active flag.
    pub is_active: bool,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<class_fee_structures::Model> for ClassFeeResponse {
    fn from(model: class_fee_structures::Model) -> Self {
        Self {
            id: model.id,
            academic_year_id: model.academic_year_id,
            class_id: model.class_id,
            fee_component_id: model.fee_component_id,
            amount: model.amount.to_string(),
            frequency: core::FeeFrequency::from(model.frequency),
            due_date: model.due_date,
            is_mandatory: model.is_mandatory,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// One template row with its component's display fields.
#[derive(Debug, Serialize)]
pub struct ClassFeeItemResponse {
    /// Template row ID.
    pub id: Uuid,
    /// Fee component.
    pub fee_component_id: Uuid,
    /// Component display name.
    pub fee_component_name: String,
    /// Component code.
    pub fee_component_code: String,
    /// Charge amount.
    pub amount: String,
    /// Billing frequency.
    pub frequency: core::FeeFrequency,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Mandatory flag.
    pub is_mandatory: bool,
    /// Active flag.
    pub is_active: bool,
}

/// Template rows of one class for an academic year.
#[derive(Debug, Serialize)]
pub struct ClassFeesByClassResponse {
    /// Academic year.
    pub academic_year_id: Uuid,
    /// Class.
    pub class_id: Uuid,
    /// Class display name.
    pub class_name: String,
    /// Template rows.
    pub items: Vec<ClassFeeItemResponse>,
}

impl From<ClassFeesByClass> for ClassFeesByClassResponse {
    fn from(group: ClassFeesByClass) -> Self {
        Self {
            academic_year_id: group.academic_year_id,
            class_id: group.class_id,
            class_name: group.class_name,
            items: group
                .items
                .into_iter()
                .map(|item| ClassFeeItemResponse {
                    id: item.structure.id,
                    fee_component_id: item.structure.fee_component_id,
                    fee_component_name: item.fee_component_name,
                    fee_component_code: item.fee_component_code,
                    amount: item.structure.amount.to_string(),
                    frequency: core::FeeFrequency::from(item.structure.frequency),
                    due_date: item.structure.due_date,
                    is_mandatory: item.structure.is_mandatory,
                    is_active: item.structure.is_active,
                })
                .collect(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/class-fees` - Create a class fee template row.
async fn create_class_fee(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateClassFeeRequest>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let repo = ClassFeeRepository::new((*state.db).clone());
    let input = CreateClassFeeInput {
        academic_year_id: payload.academic_year_id,
        class_id: payload.class_id,
        fee_component_id: payload.fee_component_id,
        amount: payload.amount,
        frequency: payload.frequency,
        due_date: payload.due_date,
        is_mandatory: payload.is_mandatory,
    };

    match repo
        .create_structure(auth.tenant_id(), input, Some(auth.user_id()))
        .await
    {
        Ok(structure) => (StatusCode::CREATED, Json(ClassFeeResponse::from(structure)))
            .into_response(),
        Err(e) => fee_error_response(&e),
    }
}

/// GET `/class-fees` - List active template rows for a year.
async fn list_class_fees(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListClassFeesQuery>,
) -> impl IntoResponse {
    let repo = ClassFeeRepository::new((*state.db).clone());

    match repo
        .list(auth.tenant_id(), query.academic_year_id, query.class_id)
        .await
    {
        Ok(structures) => {
            let response: Vec<ClassFeeResponse> =
                structures.into_iter().map(ClassFeeResponse::from).collect();
            Json(response).into_response()
        }
        Err(e) => fee_error_response(&e),
    }
}

/// GET `/class-fees/by-class` - Template rows grouped per class.
async fn list_class_fees_by_class(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<GroupedClassFeesQuery>,
) -> impl IntoResponse {
    let repo = ClassFeeRepository::new((*state.db).clone());

    match repo
        .list_grouped_by_class(auth.tenant_id(), query.academic_year_id, query.active_only)
        .await
    {
        Ok(groups) => {
            let response: Vec<ClassFeesByClassResponse> = groups
                .into_iter()
                .map(ClassFeesByClassResponse::from)
                .collect();
            Json(response).into_response()
        }
        Err(e) => fee_error_response(&e),
    }
}
