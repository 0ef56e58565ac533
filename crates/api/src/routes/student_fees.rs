//! Student fee lifecycle routes: assignments, discounts, payments.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use vidya_core::fees::types as core;
use vidya_db::entities::{payment_transactions, student_fee_assignments, student_fee_discounts};
use vidya_db::repositories::student_fee::{
    AddCustomFeeInput, AddDiscountInput, AssignTemplateFeesInput, AssignmentWithDetails,
    OptionalComponentSelection, RecordPaymentInput, StudentFeeRepository,
};

use super::{discount_policy, fee_error_response, require_admin, role_tier};

/// Creates the student fee routes (auth middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/students/{student_id}/fees/assign-template",
            post(assign_template_fees),
        )
        .route("/students/{student_id}/fees/custom", post(add_custom_fee))
        .route("/students/{student_id}/fees", get(get_student_fees))
        .route(
            "/fee-assignments/{assignment_id}/discounts",
            post(add_discount),
        )
        .route("/discounts/{discount_id}", delete(deactivate_discount))
        .route(
            "/fee-assignments/{assignment_id}/payments",
            post(record_payment),
        )
        .route("/students/{student_id}/payments", get(get_payment_history))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// One optional template row picked by the caller.
#[derive(Debug, Deserialize)]
pub struct OptionalComponentRequest {
    /// The optional template row.
    pub class_fee_structure_id: Uuid,
    /// Admin override of the template amount.
    pub custom_amount: Option<Decimal>,
}

/// Request body for assigning template fees.
#[derive(Debug, Deserialize)]
pub struct AssignTemplateFeesRequest {
    /// Academic year to assign for.
    pub academic_year_id: Uuid,
    /// Selected optional rows.
    #[serde(default)]
    pub optional_components: Vec<OptionalComponentRequest>,
}

/// Request body for a custom one-off charge.
#[derive(Debug, Deserialize)]
pub struct AddCustomFeeRequest {
    /// Academic year.
    pub academic_year_id: Uuid,
    /// Charge display name.
    pub custom_name: String,
    /// Charge amount.
    pub amount: Decimal,
    /// Optional reason.
    pub reason: Option<String>,
}

/// Request body for granting a discount.
#[derive(Debug, Deserialize)]
pub struct AddDiscountRequest {
    /// Discount display name.
    pub discount_name: String,
    /// Administrative category.
    pub discount_category: core::DiscountCategory,
    /// Fixed amount or percentage.
    pub discount_type: core::DiscountType,
    /// Value (amount or percent).
    pub discount_value: Decimal,
    /// Optional reason.
    pub reason: Option<String>,
}

/// Request body for recording a payment.
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    /// Amount paid.
    pub amount_paid: Decimal,
    /// Collection mode.
    pub payment_mode: core::PaymentMode,
    /// Optional external reference.
    pub transaction_reference: Option<String>,
    /// Payment timestamp; defaults to now (UTC).
    pub paid_at: Option<DateTime<Utc>>,
}

/// Query parameters scoped to one academic year.
#[derive(Debug, Deserialize)]
pub struct YearScopeQuery {
    /// Optional academic year filter.
    pub academic_year_id: Option<Uuid>,
}

/// Response for a student fee assignment.
#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    /// Assignment ID.
    pub id: Uuid,
    /// Academic year.
    pub academic_year_id: Uuid,
    /// Student.
    pub student_id: Uuid,
    /// Origin of the assignment.
    pub source_type: core::FeeSourceType,
    /// Template row for TEMPLATE assignments.
    pub class_fee_structure_id: Option<Uuid>,
    /// Charge name for CUSTOM assignments.
    pub custom_name: Option<String>,
    /// Frozen snapshot amount.
    pub base_amount: String,
    /// Sum of active discounts.
    pub total_discount: String,
    /// Amount owed after discounts.
    pub final_amount: String,
    /// Derived payment status.
    pub status: core::PaymentStatus,
    /// Active flag.
    pub is_active: bool,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<student_fee_assignments::Model> for AssignmentResponse {
    fn from(model: student_fee_assignments::Model) -> Self {
        Self {
            id: model.id,
            academic_year_id: model.academic_year_id,
            student_id: model.student_id,
            source_type: core::FeeSourceType::from(model.source_type),
            class_fee_structure_id: model.class_fee_structure_id,
            custom_name: model.custom_name,
            base_amount: model.base_amount.to_string(),
            total_discount: model.total_discount.to_string(),
            final_amount: model.final_amount.to_string(),
            status: core::PaymentStatus::from(model.status),
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Assignment response with joined display fields.
#[derive(Debug, Serialize)]
pub struct AssignmentWithDetailsResponse {
    /// The assignment.
    #[serde(flatten)]
    pub assignment: AssignmentResponse,
    /// Component name for TEMPLATE rows, custom name for CUSTOM rows.
    pub fee_component_name: Option<String>,
    /// Component code for TEMPLATE rows.
    pub fee_component_code: Option<String>,
    /// Class display name.
    pub class_name: Option<String>,
}

impl From<AssignmentWithDetails> for AssignmentWithDetailsResponse {
    fn from(details: AssignmentWithDetails) -> Self {
        Self {
            assignment: AssignmentResponse::from(details.assignment),
            fee_component_name: details.fee_component_name,
            fee_component_code: details.fee_component_code,
            class_name: details.class_name,
        }
    }
}

/// Response for a discount.
#[derive(Debug, Serialize)]
pub struct DiscountResponse {
    /// Discount ID.
    pub id: Uuid,
    /// Academic year.
    pub academic_year_id: Uuid,
    /// Parent assignment.
    pub student_fee_assignment_id: Uuid,
    /// Display name.
    pub discount_name: String,
    /// Administrative category.
    pub discount_category: core::DiscountCategory,
    /// Fixed amount or percentage.
    pub discount_type: core::DiscountType,
    /// Value (amount or percent).
    pub discount_value: String,
    /// Monetary amount computed at creation.
    pub calculated_discount_amount: String,
    /// Optional reason.
    pub reason: Option<String>,
    /// Approving user.
    pub approved_by: Option<Uuid>,
    /// Active flag.
    pub is_active: bool,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<student_fee_discounts::Model> for DiscountResponse {
    fn from(model: student_fee_discounts::Model) -> Self {
        Self {
            id: model.id,
            academic_year_id: model.academic_year_id,
            student_fee_assignment_id: model.student_fee_assignment_id,
            discount_name: model.discount_name,
            discount_category: core::DiscountCategory::from(model.discount_category),
            discount_type: core::DiscountType::from(model.discount_type),
            discount_value: model.discount_value.to_string(),
            calculated_discount_amount: model.calculated_discount_amount.to_string(),
            reason: model.reason,
            approved_by: model.approved_by,
            is_active: model.is_active,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Response for a payment transaction.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    /// Payment ID.
    pub id: Uuid,
    /// Academic year.
    pub academic_year_id: Uuid,
    /// Parent assignment.
    pub student_fee_assignment_id: Uuid,
    /// Amount paid.
    pub amount_paid: String,
    /// Collection mode.
    pub payment_mode: core::PaymentMode,
    /// External reference.
    pub transaction_reference: Option<String>,
    /// Transaction outcome.
    pub payment_status: core::PaymentOutcome,
    /// Payment timestamp.
    pub paid_at: String,
    /// Collecting user.
    pub collected_by: Option<Uuid>,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<payment_transactions::Model> for PaymentResponse {
    fn from(model: payment_transactions::Model) -> Self {
        Self {
            id: model.id,
            academic_year_id: model.academic_year_id,
            student_fee_assignment_id: model.student_fee_assignment_id,
            amount_paid: model.amount_paid.to_string(),
            payment_mode: core::PaymentMode::from(model.payment_mode),
            transaction_reference: model.transaction_reference,
            payment_status: core::PaymentOutcome::from(model.payment_status),
            paid_at: model.paid_at.to_rfc3339(),
            collected_by: model.collected_by,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/students/{student_id}/fees/assign-template` - Snapshot template
/// fees into assignments for one student.
async fn assign_template_fees(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<Uuid>,
    Json(payload): Json<AssignTemplateFeesRequest>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let repo = StudentFeeRepository::new((*state.db).clone());
    let input = AssignTemplateFeesInput {
        academic_year_id: payload.academic_year_id,
        optional_components: payload
            .optional_components
            .into_iter()
            .map(|oc| OptionalComponentSelection {
                class_fee_structure_id: oc.class_fee_structure_id,
                custom_amount: oc.custom_amount,
            })
            .collect(),
    };

    match repo
        .assign_template_fees(auth.tenant_id(), student_id, input, Some(auth.user_id()))
        .await
    {
        Ok(created) => {
            let response: Vec<AssignmentResponse> =
                created.into_iter().map(AssignmentResponse::from).collect();
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => fee_error_response(&e),
    }
}

/// POST `/students/{student_id}/fees/custom` - Add a custom one-off charge.
async fn add_custom_fee(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<Uuid>,
    Json(payload): Json<AddCustomFeeRequest>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let repo = StudentFeeRepository::new((*state.db).clone());
    let input = AddCustomFeeInput {
        academic_year_id: payload.academic_year_id,
        custom_name: payload.custom_name,
        amount: payload.amount,
        reason: payload.reason,
    };

    match repo
        .add_custom_fee(auth.tenant_id(), student_id, input, Some(auth.user_id()))
        .await
    {
        Ok(assignment) => (
            StatusCode::CREATED,
            Json(AssignmentResponse::from(assignment)),
        )
            .into_response(),
        Err(e) => fee_error_response(&e),
    }
}

/// GET `/students/{student_id}/fees` - The student's active assignments.
async fn get_student_fees(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<Uuid>,
    Query(query): Query<YearScopeQuery>,
) -> impl IntoResponse {
    let repo = StudentFeeRepository::new((*state.db).clone());

    match repo
        .get_student_fees(auth.tenant_id(), student_id, query.academic_year_id)
        .await
    {
        Ok(details) => {
            let response: Vec<AssignmentWithDetailsResponse> = details
                .into_iter()
                .map(AssignmentWithDetailsResponse::from)
                .collect();
            Json(response).into_response()
        }
        Err(e) => fee_error_response(&e),
    }
}

/// POST `/fee-assignments/{assignment_id}/discounts` - Grant a discount.
async fn add_discount(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(assignment_id): Path<Uuid>,
    Json(payload): Json<AddDiscountRequest>,
) -> impl IntoResponse {
    let repo = StudentFeeRepository::new((*state.db).clone());
    let input = AddDiscountInput {
        discount_name: payload.discount_name,
        discount_category: payload.discount_category,
        discount_type: payload.discount_type,
        discount_value: payload.discount_value,
        reason: payload.reason,
    };
    let policy = discount_policy(&state);

    match repo
        .add_discount(
            auth.tenant_id(),
            assignment_id,
            input,
            Some(auth.user_id()),
            role_tier(&auth),
            &policy,
        )
        .await
    {
        Ok(discount) => (StatusCode::CREATED, Json(DiscountResponse::from(discount)))
            .into_response(),
        Err(e) => fee_error_response(&e),
    }
}

/// DELETE `/discounts/{discount_id}` - Soft-deactivate a discount.
async fn deactivate_discount(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(discount_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = StudentFeeRepository::new((*state.db).clone());

    match repo
        .deactivate_discount(auth.tenant_id(), discount_id, Some(auth.user_id()))
        .await
    {
        Ok(discount) => Json(DiscountResponse::from(discount)).into_response(),
        Err(e) => fee_error_response(&e),
    }
}

/// POST `/fee-assignments/{assignment_id}/payments` - Record a payment.
async fn record_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(assignment_id): Path<Uuid>,
    Json(payload): Json<RecordPaymentRequest>,
) -> impl IntoResponse {
    let repo = StudentFeeRepository::new((*state.db).clone());
    let input = RecordPaymentInput {
        amount_paid: payload.amount_paid,
        payment_mode: payload.payment_mode,
        transaction_reference: payload.transaction_reference,
        paid_at: payload.paid_at,
    };

    match repo
        .record_payment(
            auth.tenant_id(),
            assignment_id,
            input,
            Some(auth.user_id()),
            Some(auth.user_id()),
        )
        .await
    {
        Ok(payment) => {
            (StatusCode::CREATED, Json(PaymentResponse::from(payment))).into_response()
        }
        Err(e) => fee_error_response(&e),
    }
}

/// GET `/students/{student_id}/payments` - Successful payments, newest first.
async fn get_payment_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<Uuid>,
    Query(query): Query<YearScopeQuery>,
) -> impl IntoResponse {
    let repo = StudentFeeRepository::new((*state.db).clone());

    match repo
        .get_payment_history(auth.tenant_id(), student_id, query.academic_year_id)
        .await
    {
        Ok(payments) => {
            let response: Vec<PaymentResponse> =
                payments.into_iter().map(PaymentResponse::from).collect();
            Json(response).into_response()
        }
        Err(e) => fee_error_response(&e),
    }
}
