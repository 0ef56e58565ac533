//! Student fee ledger repository.
//!
//! Owns the transactional write paths of the fee lifecycle: template
//! assignment snapshots, custom charges, the discount and payment ledgers,
//! and the derived-totals recalculation that follows every ledger write.
//!
//! Concurrency: discount and payment mutations take a row-level lock
//! (`SELECT ... FOR UPDATE`) on the parent assignment before re-reading the
//! ledgers, so recalculations for one assignment are serialized while
//! different assignments proceed in parallel.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use vidya_core::fees::{DiscountPolicy, FeeError, FeeService, types as core};

use super::audit::log_fee_audit;
use super::{db_err, is_unique_violation};
use crate::entities::{
    academic_years, class_fee_structures, fee_components, payment_transactions, school_classes,
    sea_orm_active_enums::{
        AuditAction, DiscountCategory, DiscountType, EnrollmentStatus, FeeSourceType, PaymentMode,
        PaymentOutcome, PaymentStatus,
    },
    sections, student_academic_records, student_fee_assignments, student_fee_discounts, students,
};

/// Caller's pick of one optional template row.
#[derive(Debug, Clone)]
pub struct OptionalComponentSelection {
    /// The optional template row to assign.
    pub class_fee_structure_id: Uuid,
    /// Admin-supplied override of the template amount.
    pub custom_amount: Option<Decimal>,
}

/// Input for assigning template fees to a student.
#[derive(Debug, Clone)]
pub struct AssignTemplateFeesInput {
    /// Academic year to assign for.
    pub academic_year_id: Uuid,
    /// Explicitly selected optional template rows.
    pub optional_components: Vec<OptionalComponentSelection>,
}

/// Input for adding a custom one-off charge.
#[derive(Debug, Clone)]
pub struct AddCustomFeeInput {
    /// Academic year the charge belongs to.
    pub academic_year_id: Uuid,
    /// Display name of the charge.
    pub custom_name: String,
    /// Charge amount (non-negative).
    pub amount: Decimal,
    /// Optional reason, kept in the audit trail.
    pub reason: Option<String>,
}

/// Input for granting a discount against an assignment.
#[derive(Debug, Clone)]
pub struct AddDiscountInput {
    /// Display name of the discount.
    pub discount_name: String,
    /// Administrative category.
    pub discount_category: core::DiscountCategory,
    /// Fixed amount or percentage.
    pub discount_type: core::DiscountType,
    /// Value (amount or percent, non-negative).
    pub discount_value: Decimal,
    /// Optional reason.
    pub reason: Option<String>,
}

/// Input for recording a payment against an assignment.
#[derive(Debug, Clone)]
pub struct RecordPaymentInput {
    /// Amount paid (positive, capped at the remaining balance).
    pub amount_paid: Decimal,
    /// Collection mode.
    pub payment_mode: core::PaymentMode,
    /// Optional external reference.
    pub transaction_reference: Option<String>,
    /// Payment timestamp; defaults to now (UTC).
    pub paid_at: Option<DateTime<Utc>>,
}

/// Assignment joined with its display fields.
#[derive(Debug, Clone)]
pub struct AssignmentWithDetails {
    /// Assignment row.
    pub assignment: student_fee_assignments::Model,
    /// Component name for TEMPLATE rows, custom name for CUSTOM rows.
    pub fee_component_name: Option<String>,
    /// Component code for TEMPLATE rows.
    pub fee_component_code: Option<String>,
    /// Class name from the template row or the enrollment record.
    pub class_name: Option<String>,
}

/// One row of the fee report.
#[derive(Debug, Clone)]
pub struct FeeReportRow {
    /// Student.
    pub student_id: Uuid,
    /// Student display name.
    pub student_name: Option<String>,
    /// Class the charge belongs to.
    pub class_id: Option<Uuid>,
    /// Class display name.
    pub class_name: Option<String>,
    /// Section from the enrollment record.
    pub section_id: Option<Uuid>,
    /// Section display name.
    pub section_name: Option<String>,
    /// Assignment.
    pub assignment_id: Uuid,
    /// Component or custom charge name.
    pub fee_component_name: Option<String>,
    /// Frozen snapshot amount.
    pub base_amount: Decimal,
    /// Sum of active discounts.
    pub total_discount: Decimal,
    /// Amount owed after discounts.
    pub final_amount: Decimal,
    /// Sum of successful payments.
    pub amount_paid: Decimal,
    /// Remaining balance.
    pub balance: Decimal,
    /// Derived payment status.
    pub status: core::PaymentStatus,
}

/// Student fee ledger repository.
#[derive(Debug, Clone)]
pub struct StudentFeeRepository {
    db: DatabaseConnection,
}

impl StudentFeeRepository {
    /// Creates a new student fee repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Assignment creation
    // ========================================================================

    /// Assigns template fees to a student for an academic year.
    ///
    /// Every mandatory template row of the student's class is snapshotted
    /// into an assignment unless one already exists (idempotent skip).
    /// Selected optional rows are snapshotted with the template amount or
    /// an admin override. All creation happens in one transaction; each
    /// created snapshot writes one CREATE audit row.
    ///
    /// # Errors
    ///
    /// Returns validation errors per the preconditions; a failed call
    /// creates none of the requested assignments.
    pub async fn assign_template_fees(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
        input: AssignTemplateFeesInput,
        changed_by: Option<Uuid>,
    ) -> Result<Vec<student_fee_assignments::Model>, FeeError> {
        let academic_year_id = input.academic_year_id;
        self.writable_year(tenant_id, academic_year_id).await?;
        self.valid_student(tenant_id, student_id).await?;

        let enrollment = student_academic_records::Entity::find()
            .filter(student_academic_records::Column::StudentId.eq(student_id))
            .filter(student_academic_records::Column::AcademicYearId.eq(academic_year_id))
            .filter(student_academic_records::Column::Status.eq(EnrollmentStatus::Active))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(FeeError::NotEnrolled)?;

        let structures = class_fee_structures::Entity::find()
            .filter(class_fee_structures::Column::TenantId.eq(tenant_id))
            .filter(class_fee_structures::Column::AcademicYearId.eq(academic_year_id))
            .filter(class_fee_structures::Column::ClassId.eq(enrollment.class_id))
            .filter(class_fee_structures::Column::IsActive.eq(true))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        if structures.is_empty() {
            return Err(FeeError::NoTemplatesForClass);
        }

        let (mandatory, optional): (Vec<_>, Vec<_>) =
            structures.into_iter().partition(|s| s.is_mandatory);
        let optional_map: HashMap<Uuid, class_fee_structures::Model> =
            optional.into_iter().map(|s| (s.id, s)).collect();

        // Selections must reference optional rows of this class and year;
        // mandatory rows are assigned automatically and not selectable
        for selection in &input.optional_components {
            if !optional_map.contains_key(&selection.class_fee_structure_id) {
                return Err(FeeError::InvalidOptionalSelection(
                    selection.class_fee_structure_id,
                ));
            }
        }

        let mut to_assign: Vec<(class_fee_structures::Model, Option<Decimal>)> =
            mandatory.into_iter().map(|s| (s, None)).collect();
        for selection in &input.optional_components {
            if let Some(structure) = optional_map.get(&selection.class_fee_structure_id) {
                to_assign.push((structure.clone(), selection.custom_amount));
            }
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let mut created = Vec::new();

        for (structure, override_amount) in to_assign {
            let existing = student_fee_assignments::Entity::find()
                .filter(student_fee_assignments::Column::StudentId.eq(student_id))
                .filter(student_fee_assignments::Column::AcademicYearId.eq(academic_year_id))
                .filter(student_fee_assignments::Column::SourceType.eq(FeeSourceType::Template))
                .filter(student_fee_assignments::Column::ClassFeeStructureId.eq(structure.id))
                .filter(student_fee_assignments::Column::IsActive.eq(true))
                .one(&txn)
                .await
                .map_err(db_err)?;
            if existing.is_some() {
                continue;
            }

            let amount = override_amount.unwrap_or(structure.amount);
            FeeService::validate_charge_amount(amount)?;

            let now = Utc::now().into();
            let assignment = student_fee_assignments::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(tenant_id),
                academic_year_id: Set(academic_year_id),
                student_id: Set(student_id),
                source_type: Set(FeeSourceType::Template),
                class_fee_structure_id: Set(Some(structure.id)),
                custom_name: Set(None),
                base_amount: Set(amount),
                total_discount: Set(Decimal::ZERO),
                final_amount: Set(amount),
                status: Set(PaymentStatus::Unpaid),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
            };

            let assignment = assignment.insert(&txn).await.map_err(|e| {
                if is_unique_violation(&e) {
                    FeeError::DuplicateAssignment
                } else {
                    db_err(e)
                }
            })?;

            log_fee_audit(
                &txn,
                tenant_id,
                "student_fee_assignments",
                assignment.id,
                AuditAction::Create,
                None,
                Some(json!({
                    "student_id": student_id.to_string(),
                    "source_type": core::FeeSourceType::Template,
                    "class_fee_structure_id": structure.id.to_string(),
                    "base_amount": amount.to_string(),
                    "final_amount": amount.to_string(),
                })),
                changed_by,
            )
            .await
            .map_err(db_err)?;

            created.push(assignment);
        }

        txn.commit().await.map_err(db_err)?;
        Ok(created)
    }

    /// Adds a custom one-off charge for a student.
    ///
    /// # Errors
    ///
    /// Returns validation errors per the preconditions.
    pub async fn add_custom_fee(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
        input: AddCustomFeeInput,
        changed_by: Option<Uuid>,
    ) -> Result<student_fee_assignments::Model, FeeError> {
        self.writable_year(tenant_id, input.academic_year_id).await?;
        self.valid_student(tenant_id, student_id).await?;
        FeeService::validate_custom_name(&input.custom_name)?;
        FeeService::validate_charge_amount(input.amount)?;

        let custom_name = input.custom_name.trim().to_string();
        let reason = input
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let txn = self.db.begin().await.map_err(db_err)?;

        let now = Utc::now().into();
        let assignment = student_fee_assignments::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            academic_year_id: Set(input.academic_year_id),
            student_id: Set(student_id),
            source_type: Set(FeeSourceType::Custom),
            class_fee_structure_id: Set(None),
            custom_name: Set(Some(custom_name.clone())),
            base_amount: Set(input.amount),
            total_discount: Set(Decimal::ZERO),
            final_amount: Set(input.amount),
            status: Set(PaymentStatus::Unpaid),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let assignment = assignment.insert(&txn).await.map_err(db_err)?;

        log_fee_audit(
            &txn,
            tenant_id,
            "student_fee_assignments",
            assignment.id,
            AuditAction::Create,
            None,
            Some(json!({
                "student_id": student_id.to_string(),
                "source_type": core::FeeSourceType::Custom,
                "custom_name": custom_name,
                "base_amount": input.amount.to_string(),
                "final_amount": input.amount.to_string(),
                "reason": reason,
            })),
            changed_by,
        )
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(assignment)
    }

    /// Lists a student's active assignments with display fields.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn get_student_fees(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
        academic_year_id: Option<Uuid>,
    ) -> Result<Vec<AssignmentWithDetails>, FeeError> {
        let mut query = student_fee_assignments::Entity::find()
            .filter(student_fee_assignments::Column::TenantId.eq(tenant_id))
            .filter(student_fee_assignments::Column::StudentId.eq(student_id))
            .filter(student_fee_assignments::Column::IsActive.eq(true));
        if let Some(year_id) = academic_year_id {
            query = query.filter(student_fee_assignments::Column::AcademicYearId.eq(year_id));
        }
        let assignments = query
            .order_by_asc(student_fee_assignments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let structure_ids: Vec<Uuid> = assignments
            .iter()
            .filter_map(|a| a.class_fee_structure_id)
            .collect();
        let structures: HashMap<Uuid, class_fee_structures::Model> =
            class_fee_structures::Entity::find()
                .filter(class_fee_structures::Column::Id.is_in(structure_ids))
                .all(&self.db)
                .await
                .map_err(db_err)?
                .into_iter()
                .map(|s| (s.id, s))
                .collect();

        let component_ids: Vec<Uuid> = structures.values().map(|s| s.fee_component_id).collect();
        let components: HashMap<Uuid, fee_components::Model> = fee_components::Entity::find()
            .filter(fee_components::Column::Id.is_in(component_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let enrollments: HashMap<Uuid, student_academic_records::Model> =
            student_academic_records::Entity::find()
                .filter(student_academic_records::Column::StudentId.eq(student_id))
                .all(&self.db)
                .await
                .map_err(db_err)?
                .into_iter()
                .map(|r| (r.academic_year_id, r))
                .collect();

        let mut class_ids: Vec<Uuid> = structures.values().map(|s| s.class_id).collect();
        class_ids.extend(enrollments.values().map(|r| r.class_id));
        let classes: HashMap<Uuid, school_classes::Model> = school_classes::Entity::find()
            .filter(school_classes::Column::Id.is_in(class_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let details = assignments
            .into_iter()
            .map(|assignment| {
                let structure = assignment
                    .class_fee_structure_id
                    .and_then(|id| structures.get(&id));
                let component = structure.and_then(|s| components.get(&s.fee_component_id));

                let (fee_component_name, fee_component_code) = match assignment.source_type {
                    FeeSourceType::Custom => (assignment.custom_name.clone(), None),
                    FeeSourceType::Template => (
                        component.map(|c| c.name.clone()),
                        component.map(|c| c.code.clone()),
                    ),
                };

                let class_id = structure.map(|s| s.class_id).or_else(|| {
                    enrollments
                        .get(&assignment.academic_year_id)
                        .map(|r| r.class_id)
                });
                let class_name =
                    class_id.and_then(|id| classes.get(&id).map(|c| c.name.clone()));

                AssignmentWithDetails {
                    assignment,
                    fee_component_name,
                    fee_component_code,
                    class_name,
                }
            })
            .collect();

        Ok(details)
    }

    // ========================================================================
    // Discount ledger
    // ========================================================================

    /// Grants a discount against an assignment.
    ///
    /// The parent assignment row is locked for the duration of the
    /// transaction; the active discount total is re-read under the lock
    /// before the cap check, then the assignment's totals are recalculated
    /// from the ledgers.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::AssignmentNotFound`, `FeeError::DiscountNotAllowed`,
    /// `FeeError::DiscountRequiresElevation`, or `FeeError::OverDiscount`.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_discount(
        &self,
        tenant_id: Uuid,
        assignment_id: Uuid,
        input: AddDiscountInput,
        approved_by: Option<Uuid>,
        caller: core::RoleTier,
        policy: &DiscountPolicy,
    ) -> Result<student_fee_discounts::Model, FeeError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let assignment = lock_assignment(&txn, tenant_id, assignment_id).await?;
        assert_year_writable(&txn, tenant_id, assignment.academic_year_id).await?;

        let allow_discount = match assignment.source_type {
            FeeSourceType::Custom => true,
            FeeSourceType::Template => {
                let structure = match assignment.class_fee_structure_id {
                    Some(id) => class_fee_structures::Entity::find_by_id(id)
                        .one(&txn)
                        .await
                        .map_err(db_err)?,
                    None => None,
                };
                let component = match structure {
                    Some(s) => fee_components::Entity::find_by_id(s.fee_component_id)
                        .one(&txn)
                        .await
                        .map_err(db_err)?,
                    None => None,
                };
                component.is_some_and(|c| c.allow_discount)
            }
        };

        let existing_total: Decimal = active_discount_amounts(&txn, assignment.id)
            .await?
            .iter()
            .copied()
            .sum();

        let calculated = FeeService::validate_discount(
            assignment.base_amount,
            existing_total,
            allow_discount,
            input.discount_type,
            input.discount_value,
            caller,
            policy,
        )?;

        let now = Utc::now().into();
        let discount = student_fee_discounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            academic_year_id: Set(assignment.academic_year_id),
            student_fee_assignment_id: Set(assignment.id),
            discount_name: Set(input.discount_name.trim().to_string()),
            discount_category: Set(DiscountCategory::from(input.discount_category)),
            discount_type: Set(DiscountType::from(input.discount_type)),
            discount_value: Set(input.discount_value),
            calculated_discount_amount: Set(calculated),
            reason: Set(input
                .reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())),
            approved_by: Set(approved_by),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let discount = discount.insert(&txn).await.map_err(db_err)?;

        log_fee_audit(
            &txn,
            tenant_id,
            "student_fee_discounts",
            discount.id,
            AuditAction::Create,
            None,
            Some(json!({
                "student_fee_assignment_id": assignment.id.to_string(),
                "discount_name": discount.discount_name,
                "discount_type": input.discount_type,
                "discount_value": input.discount_value.to_string(),
                "calculated_discount_amount": calculated.to_string(),
            })),
            approved_by,
        )
        .await
        .map_err(db_err)?;

        recalculate_assignment(&txn, assignment, tenant_id, approved_by).await?;

        txn.commit().await.map_err(db_err)?;
        Ok(discount)
    }

    /// Soft-deactivates a discount and recalculates the parent assignment.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::DiscountNotFound` when the discount does not
    /// exist, `FeeError::AssignmentNotFound` when its parent is gone.
    pub async fn deactivate_discount(
        &self,
        tenant_id: Uuid,
        discount_id: Uuid,
        changed_by: Option<Uuid>,
    ) -> Result<student_fee_discounts::Model, FeeError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let discount = student_fee_discounts::Entity::find_by_id(discount_id)
            .filter(student_fee_discounts::Column::TenantId.eq(tenant_id))
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(FeeError::DiscountNotFound(discount_id))?;

        let assignment_id = discount.student_fee_assignment_id;
        let assignment = student_fee_assignments::Entity::find_by_id(assignment_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(FeeError::AssignmentNotFound(assignment_id))?;
        assert_year_writable(&txn, tenant_id, assignment.academic_year_id).await?;

        let calculated = discount.calculated_discount_amount;
        let mut active: student_fee_discounts::ActiveModel = discount.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        let discount = active.update(&txn).await.map_err(db_err)?;

        log_fee_audit(
            &txn,
            tenant_id,
            "student_fee_discounts",
            discount.id,
            AuditAction::Deactivate,
            Some(json!({
                "is_active": true,
                "calculated_discount_amount": calculated.to_string(),
            })),
            Some(json!({ "is_active": false })),
            changed_by,
        )
        .await
        .map_err(db_err)?;

        recalculate_assignment(&txn, assignment, tenant_id, changed_by).await?;

        txn.commit().await.map_err(db_err)?;
        Ok(discount)
    }

    // ========================================================================
    // Payment ledger
    // ========================================================================

    /// Records a successful payment against an assignment.
    ///
    /// The balance is recomputed under the assignment lock; overpayment is
    /// rejected before any write. A recorded payment is permanent.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::AssignmentNotFound`, `FeeError::NonPositivePayment`,
    /// or `FeeError::Overpayment`.
    pub async fn record_payment(
        &self,
        tenant_id: Uuid,
        assignment_id: Uuid,
        input: RecordPaymentInput,
        collected_by: Option<Uuid>,
        changed_by: Option<Uuid>,
    ) -> Result<payment_transactions::Model, FeeError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let assignment = lock_assignment(&txn, tenant_id, assignment_id).await?;
        assert_year_writable(&txn, tenant_id, assignment.academic_year_id).await?;
        let old_status = core::PaymentStatus::from(assignment.status.clone());

        let total_paid: Decimal = successful_payment_amounts(&txn, assignment.id)
            .await?
            .iter()
            .copied()
            .sum();
        FeeService::validate_payment(input.amount_paid, assignment.final_amount, total_paid)?;

        let paid_at = input.paid_at.unwrap_or_else(Utc::now);
        let payment = payment_transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            academic_year_id: Set(assignment.academic_year_id),
            student_fee_assignment_id: Set(assignment.id),
            amount_paid: Set(input.amount_paid),
            payment_mode: Set(PaymentMode::from(input.payment_mode)),
            transaction_reference: Set(input
                .transaction_reference
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())),
            payment_status: Set(PaymentOutcome::Success),
            paid_at: Set(paid_at.into()),
            collected_by: Set(collected_by),
            created_at: Set(Utc::now().into()),
        };
        let payment = payment.insert(&txn).await.map_err(db_err)?;

        let updated = recalculate_assignment(&txn, assignment, tenant_id, changed_by).await?;
        let new_status = core::PaymentStatus::from(updated.status);

        log_fee_audit(
            &txn,
            tenant_id,
            "payment_transactions",
            payment.id,
            AuditAction::Create,
            None,
            Some(json!({
                "amount_paid": input.amount_paid.to_string(),
                "payment_mode": input.payment_mode,
                "student_fee_assignment_id": assignment_id.to_string(),
                "assignment_old_status": old_status,
                "assignment_new_status": new_status,
            })),
            changed_by,
        )
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(payment)
    }

    /// Lists a student's successful payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_payment_history(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
        academic_year_id: Option<Uuid>,
    ) -> Result<Vec<payment_transactions::Model>, FeeError> {
        let mut query = payment_transactions::Entity::find()
            .filter(payment_transactions::Column::TenantId.eq(tenant_id))
            .filter(payment_transactions::Column::PaymentStatus.eq(PaymentOutcome::Success))
            .inner_join(student_fee_assignments::Entity)
            .filter(student_fee_assignments::Column::StudentId.eq(student_id));
        if let Some(year_id) = academic_year_id {
            query = query.filter(payment_transactions::Column::AcademicYearId.eq(year_id));
        }

        query
            .order_by_desc(payment_transactions::Column::PaidAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    // ========================================================================
    // Fee report
    // ========================================================================

    /// Builds the fee report for an academic year.
    ///
    /// Read-only: totals come from the stored recalculated columns plus a
    /// payment sum per assignment; nothing is recomputed or written.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn get_fee_report(
        &self,
        tenant_id: Uuid,
        academic_year_id: Uuid,
        class_id: Option<Uuid>,
        status_filter: Option<core::PaymentStatus>,
    ) -> Result<Vec<FeeReportRow>, FeeError> {
        let mut query = student_fee_assignments::Entity::find()
            .filter(student_fee_assignments::Column::TenantId.eq(tenant_id))
            .filter(student_fee_assignments::Column::AcademicYearId.eq(academic_year_id))
            .filter(student_fee_assignments::Column::IsActive.eq(true));
        if let Some(status) = status_filter {
            query = query
                .filter(student_fee_assignments::Column::Status.eq(PaymentStatus::from(status)));
        }
        let assignments = query.all(&self.db).await.map_err(db_err)?;

        let structure_ids: Vec<Uuid> = assignments
            .iter()
            .filter_map(|a| a.class_fee_structure_id)
            .collect();
        let structures: HashMap<Uuid, class_fee_structures::Model> =
            class_fee_structures::Entity::find()
                .filter(class_fee_structures::Column::Id.is_in(structure_ids))
                .all(&self.db)
                .await
                .map_err(db_err)?
                .into_iter()
                .map(|s| (s.id, s))
                .collect();

        let component_ids: Vec<Uuid> = structures.values().map(|s| s.fee_component_id).collect();
        let components: HashMap<Uuid, fee_components::Model> = fee_components::Entity::find()
            .filter(fee_components::Column::Id.is_in(component_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let enrollments: HashMap<Uuid, student_academic_records::Model> =
            student_academic_records::Entity::find()
                .filter(student_academic_records::Column::TenantId.eq(tenant_id))
                .filter(student_academic_records::Column::AcademicYearId.eq(academic_year_id))
                .all(&self.db)
                .await
                .map_err(db_err)?
                .into_iter()
                .map(|r| (r.student_id, r))
                .collect();

        let mut class_ids: Vec<Uuid> = structures.values().map(|s| s.class_id).collect();
        class_ids.extend(enrollments.values().map(|r| r.class_id));
        let classes: HashMap<Uuid, school_classes::Model> = school_classes::Entity::find()
            .filter(school_classes::Column::Id.is_in(class_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let section_ids: Vec<Uuid> = enrollments
            .values()
            .filter_map(|r| r.section_id)
            .collect();
        let section_names: HashMap<Uuid, sections::Model> = sections::Entity::find()
            .filter(sections::Column::Id.is_in(section_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let student_ids: Vec<Uuid> = assignments.iter().map(|a| a.student_id).collect();
        let student_names: HashMap<Uuid, String> = students::Entity::find()
            .filter(students::Column::Id.is_in(student_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|s| (s.id, s.full_name))
            .collect();

        // One pass over the year's successful payments, grouped per assignment
        let mut paid_totals: HashMap<Uuid, Decimal> = HashMap::new();
        let payments = payment_transactions::Entity::find()
            .filter(payment_transactions::Column::TenantId.eq(tenant_id))
            .filter(payment_transactions::Column::AcademicYearId.eq(academic_year_id))
            .filter(payment_transactions::Column::PaymentStatus.eq(PaymentOutcome::Success))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        for payment in payments {
            *paid_totals
                .entry(payment.student_fee_assignment_id)
                .or_insert(Decimal::ZERO) += payment.amount_paid;
        }

        let mut rows = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let structure = assignment
                .class_fee_structure_id
                .and_then(|id| structures.get(&id));
            let enrollment = enrollments.get(&assignment.student_id);

            let row_class_id = structure
                .map(|s| s.class_id)
                .or_else(|| enrollment.map(|r| r.class_id));
            if let Some(filter_id) = class_id {
                if row_class_id != Some(filter_id) {
                    continue;
                }
            }

            let fee_component_name = match assignment.source_type {
                FeeSourceType::Custom => assignment.custom_name.clone(),
                FeeSourceType::Template => structure
                    .and_then(|s| components.get(&s.fee_component_id))
                    .map(|c| c.name.clone()),
            };

            let section_id = enrollment.and_then(|r| r.section_id);
            let amount_paid = paid_totals
                .get(&assignment.id)
                .copied()
                .unwrap_or(Decimal::ZERO);

            rows.push(FeeReportRow {
                student_id: assignment.student_id,
                student_name: student_names.get(&assignment.student_id).cloned(),
                class_id: row_class_id,
                class_name: row_class_id
                    .and_then(|id| classes.get(&id).map(|c| c.name.clone())),
                section_id,
                section_name: section_id
                    .and_then(|id| section_names.get(&id).map(|s| s.name.clone())),
                assignment_id: assignment.id,
                fee_component_name,
                base_amount: assignment.base_amount,
                total_discount: assignment.total_discount,
                final_amount: assignment.final_amount,
                amount_paid,
                balance: assignment.final_amount - amount_paid,
                status: core::PaymentStatus::from(assignment.status),
            });
        }

        rows.sort_by(|a, b| {
            (a.class_name.clone(), a.fee_component_name.clone())
                .cmp(&(b.class_name.clone(), b.fee_component_name.clone()))
        });

        Ok(rows)
    }

    // ========================================================================
    // Precondition helpers
    // ========================================================================

    /// Loads an academic year and checks it is writable.
    async fn writable_year(
        &self,
        tenant_id: Uuid,
        academic_year_id: Uuid,
    ) -> Result<academic_years::Model, FeeError> {
        let year = academic_years::Entity::find_by_id(academic_year_id)
            .filter(academic_years::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(FeeError::InvalidYear(academic_year_id))?;
        if !core::AcademicYearStatus::from(year.status.clone()).is_writable() {
            return Err(FeeError::YearClosed);
        }
        Ok(year)
    }

    /// Checks the student exists within the tenant.
    async fn valid_student(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<students::Model, FeeError> {
        students::Entity::find_by_id(student_id)
            .filter(students::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(FeeError::InvalidStudent(student_id))
    }
}

// ============================================================================
// Transaction-scoped helpers
// ============================================================================

/// Checks the assignment's academic year is still writable.
///
/// Once a year is CLOSED its entire fee ledger is read-only, so every
/// ledger mutation re-checks the flag inside its transaction.
async fn assert_year_writable(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    academic_year_id: Uuid,
) -> Result<(), FeeError> {
    let year = academic_years::Entity::find_by_id(academic_year_id)
        .filter(academic_years::Column::TenantId.eq(tenant_id))
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(FeeError::InvalidYear(academic_year_id))?;
    if !core::AcademicYearStatus::from(year.status).is_writable() {
        return Err(FeeError::YearClosed);
    }
    Ok(())
}

/// Locks an active assignment row for update within the transaction.
async fn lock_assignment(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    assignment_id: Uuid,
) -> Result<student_fee_assignments::Model, FeeError> {
    student_fee_assignments::Entity::find_by_id(assignment_id)
        .filter(student_fee_assignments::Column::TenantId.eq(tenant_id))
        .filter(student_fee_assignments::Column::IsActive.eq(true))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(FeeError::AssignmentNotFound(assignment_id))
}

/// Reads the active discount amounts of an assignment.
async fn active_discount_amounts(
    txn: &DatabaseTransaction,
    assignment_id: Uuid,
) -> Result<Vec<Decimal>, FeeError> {
    Ok(student_fee_discounts::Entity::find()
        .filter(student_fee_discounts::Column::StudentFeeAssignmentId.eq(assignment_id))
        .filter(student_fee_discounts::Column::IsActive.eq(true))
        .all(txn)
        .await
        .map_err(db_err)?
        .iter()
        .map(|d| d.calculated_discount_amount)
        .collect())
}

/// Reads the successful payment amounts of an assignment.
async fn successful_payment_amounts(
    txn: &DatabaseTransaction,
    assignment_id: Uuid,
) -> Result<Vec<Decimal>, FeeError> {
    Ok(payment_transactions::Entity::find()
        .filter(payment_transactions::Column::StudentFeeAssignmentId.eq(assignment_id))
        .filter(payment_transactions::Column::PaymentStatus.eq(PaymentOutcome::Success))
        .all(txn)
        .await
        .map_err(db_err)?
        .iter()
        .map(|p| p.amount_paid)
        .collect())
}

/// Re-derives an assignment's totals from its ledgers and persists them,
/// writing the assignment UPDATE audit row.
///
/// Called after every discount creation or deactivation and after every
/// payment creation; never inferred lazily at read time.
async fn recalculate_assignment(
    txn: &DatabaseTransaction,
    assignment: student_fee_assignments::Model,
    tenant_id: Uuid,
    changed_by: Option<Uuid>,
) -> Result<student_fee_assignments::Model, FeeError> {
    let discounts = active_discount_amounts(txn, assignment.id).await?;
    let payments = successful_payment_amounts(txn, assignment.id).await?;
    let totals = FeeService::recalculate(assignment.base_amount, &discounts, &payments);

    let old_total_discount = assignment.total_discount;
    let old_final_amount = assignment.final_amount;
    let old_status = core::PaymentStatus::from(assignment.status.clone());
    let assignment_id = assignment.id;

    let mut active: student_fee_assignments::ActiveModel = assignment.into();
    active.total_discount = Set(totals.total_discount);
    active.final_amount = Set(totals.final_amount);
    active.status = Set(PaymentStatus::from(totals.status));
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(txn).await.map_err(db_err)?;

    log_fee_audit(
        txn,
        tenant_id,
        "student_fee_assignments",
        assignment_id,
        AuditAction::Update,
        Some(json!({
            "total_discount": old_total_discount.to_string(),
            "final_amount": old_final_amount.to_string(),
            "status": old_status,
        })),
        Some(json!({
            "total_discount": totals.total_discount.to_string(),
            "final_amount": totals.final_amount.to_string(),
            "status": totals.status,
        })),
        changed_by,
    )
    .await
    .map_err(db_err)?;

    Ok(updated)
}
