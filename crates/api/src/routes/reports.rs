//! Fee report routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use vidya_core::fees::types as core;
use vidya_db::repositories::student_fee::{FeeReportRow, StudentFeeRepository};

use super::fee_error_response;

/// Creates the report routes (auth middleware applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/reports/fees", get(get_fee_report))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the fee report.
#[derive(Debug, Deserialize)]
pub struct FeeReportQuery {
    /// Academic year to report on.
    pub academic_year_id: Uuid,
    /// Optional class filter.
    pub class_id: Option<Uuid>,
    /// Optional payment status filter.
    pub status: Option<core::PaymentStatus>,
}

/// One row of the fee report.
#[derive(Debug, Serialize)]
pub struct FeeReportRowResponse {
    /// Student.
    pub student_id: Uuid,
    /// Student display name.
    pub student_name: Option<String>,
    /// Class.
    pub class_id: Option<Uuid>,
    /// Class display name.
    pub class_name: Option<String>,
    /// Section.
    pub section_id: Option<Uuid>,
    /// Section display name.
    pub section_name: Option<String>,
    /// Assignment.
    pub assignment_id: Uuid,
    /// Component or custom charge name.
    pub fee_component_name: Option<String>,
    /// Frozen snapshot amount.
    pub base_amount: String,
    /// Sum of active discounts.
    pub total_discount: String,
    /// Amount owed after discounts.
    pub final_amount: String,
    /// Sum of successful payments.
    pub amount_paid: String,
    /// Remaining balance.
    pub balance: String,
    /// Derived payment status.
    pub status: core::PaymentStatus,
}

impl From<FeeReportRow> for FeeReportRowResponse {
    fn from(row: FeeReportRow) -> Self {
        Self {
            student_id: row.student_id,
            student_name: row.student_name,
            class_id: row.class_id,
            class_name: row.class_name,
            section_id: row.section_id,
            section_name: row.section_name,
            assignment_id: row.assignment_id,
            fee_component_name: row.fee_component_name,
            base_amount: row.base_amount.to_string(),
            total_discount: row.total_discount.to_string(),
            final_amount: row.final_amount.to_string(),
            amount_paid: row.amount_paid.to_string(),
            balance: row.balance.to_string(),
            status: row.status,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/reports/fees` - Per-assignment fee report for an academic year.
async fn get_fee_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FeeReportQuery>,
) -> impl IntoResponse {
    let repo = StudentFeeRepository::new((*state.db).clone());

    match repo
        .get_fee_report(
            auth.tenant_id(),
            query.academic_year_id,
            query.class_id,
            query.status,
        )
        .await
    {
        Ok(rows) => {
            let response: Vec<FeeReportRowResponse> =
                rows.into_iter().map(FeeReportRowResponse::from).collect();
            Json(response).into_response()
        }
        Err(e) => fee_error_response(&e),
    }
}
