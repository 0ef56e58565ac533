//! Active enum definitions mirroring the Postgres enum types.
//!
//! Each enum also converts to and from its pure counterpart in
//! `vidya_core::fees::types`, so repositories can hand values straight to
//! the fee engine.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use vidya_core::fees::types as core;

/// Lifecycle status of an academic year.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "academic_year_status")]
pub enum AcademicYearStatus {
    /// Year is open for writes.
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Year is closed; its fee ledger is read-only.
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

/// Enrollment status of a student academic record.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "enrollment_status")]
pub enum EnrollmentStatus {
    /// Currently enrolled.
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Moved to another school.
    #[sea_orm(string_value = "TRANSFERRED")]
    Transferred,
    /// Withdrawn mid-year.
    #[sea_orm(string_value = "WITHDRAWN")]
    Withdrawn,
}

/// Category of a fee component.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "fee_component_category")]
pub enum FeeComponentCategory {
    /// Tuition and other academic charges.
    #[sea_orm(string_value = "ACADEMIC")]
    Academic,
    /// Transport charges.
    #[sea_orm(string_value = "TRANSPORT")]
    Transport,
    /// Hostel and boarding charges.
    #[sea_orm(string_value = "HOSTEL")]
    Hostel,
    /// Anything else.
    #[sea_orm(string_value = "OTHER")]
    Other,
}

/// Billing frequency of a template row.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "fee_frequency")]
pub enum FeeFrequency {
    /// Charged once for the academic year.
    #[sea_orm(string_value = "one_time")]
    OneTime,
    /// Charged monthly.
    #[sea_orm(string_value = "monthly")]
    Monthly,
    /// Charged per term.
    #[sea_orm(string_value = "term_wise")]
    TermWise,
}

/// Origin of a student fee assignment.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "fee_source_type")]
pub enum FeeSourceType {
    /// Snapshotted from a class fee template row.
    #[sea_orm(string_value = "TEMPLATE")]
    Template,
    /// One-off charge entered directly for the student.
    #[sea_orm(string_value = "CUSTOM")]
    Custom,
}

/// Derived payment status of an assignment.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
pub enum PaymentStatus {
    /// No successful payment recorded yet.
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    /// Paid in part.
    #[sea_orm(string_value = "partial")]
    Partial,
    /// Paid in full.
    #[sea_orm(string_value = "paid")]
    Paid,
}

/// How a payment was collected.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_mode")]
pub enum PaymentMode {
    /// UPI transfer.
    #[sea_orm(string_value = "UPI")]
    Upi,
    /// Card payment.
    #[sea_orm(string_value = "CARD")]
    Card,
    /// Cash at the counter.
    #[sea_orm(string_value = "CASH")]
    Cash,
    /// Bank transfer.
    #[sea_orm(string_value = "BANK")]
    Bank,
}

/// Outcome of a payment transaction.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_outcome")]
pub enum PaymentOutcome {
    /// Payment settled; counts toward the balance.
    #[sea_orm(string_value = "success")]
    Success,
    /// Payment failed; kept for the record, never counted.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// How a discount value is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "discount_type")]
pub enum DiscountType {
    /// Absolute amount off the base.
    #[sea_orm(string_value = "fixed")]
    Fixed,
    /// Percentage of the original base amount.
    #[sea_orm(string_value = "percentage")]
    Percentage,
}

/// Administrative category of a discount.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "discount_category")]
pub enum DiscountCategory {
    /// From the tenant's master discount list.
    #[sea_orm(string_value = "MASTER")]
    Master,
    /// Granted ad hoc for one student.
    #[sea_orm(string_value = "CUSTOM")]
    Custom,
    /// Applied automatically by the system.
    #[sea_orm(string_value = "SYSTEM")]
    System,
}

/// Audit trail action kinds.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "audit_action")]
pub enum AuditAction {
    /// A row was created.
    #[sea_orm(string_value = "CREATE")]
    Create,
    /// A row's fields were updated.
    #[sea_orm(string_value = "UPDATE")]
    Update,
    /// A row was soft-deactivated.
    #[sea_orm(string_value = "DEACTIVATE")]
    Deactivate,
}

// ============================================================
// Conversions to/from the pure core enums
// ============================================================

impl From<AcademicYearStatus> for core::AcademicYearStatus {
    fn from(value: AcademicYearStatus) -> Self {
        match value {
            AcademicYearStatus::Active => Self::Active,
            AcademicYearStatus::Closed => Self::Closed,
        }
    }
}

impl From<EnrollmentStatus> for core::EnrollmentStatus {
    fn from(value: EnrollmentStatus) -> Self {
        match value {
            EnrollmentStatus::Active => Self::Active,
            EnrollmentStatus::Transferred => Self::Transferred,
            EnrollmentStatus::Withdrawn => Self::Withdrawn,
        }
    }
}

impl From<core::FeeComponentCategory> for FeeComponentCategory {
    fn from(value: core::FeeComponentCategory) -> Self {
        match value {
            core::FeeComponentCategory::Academic => Self::Academic,
            core::FeeComponentCategory::Transport => Self::Transport,
            core::FeeComponentCategory::Hostel => Self::Hostel,
            core::FeeComponentCategory::Other => Self::Other,
        }
    }
}

impl From<FeeComponentCategory> for core::FeeComponentCategory {
    fn from(value: FeeComponentCategory) -> Self {
        match value {
            FeeComponentCategory::Academic => Self::Academic,
            FeeComponentCategory::Transport => Self::Transport,
            FeeComponentCategory::Hostel => Self::Hostel,
            FeeComponentCategory::Other => Self::Other,
        }
    }
}

impl From<core::FeeFrequency> for FeeFrequency {
    fn from(value: core::FeeFrequency) -> Self {
        match value {
            core::FeeFrequency::OneTime => Self::OneTime,
            core::FeeFrequency::Monthly => Self::Monthly,
            core::FeeFrequency::TermWise => Self::TermWise,
        }
    }
}

impl From<FeeFrequency> for core::FeeFrequency {
    fn from(value: FeeFrequency) -> Self {
        match value {
            FeeFrequency::OneTime => Self::OneTime,
            FeeFrequency::Monthly => Self::Monthly,
            FeeFrequency::TermWise => Self::TermWise,
        }
    }
}

impl From<FeeSourceType> for core::FeeSourceType {
    fn from(value: FeeSourceType) -> Self {
        match value {
            FeeSourceType::Template => Self::Template,
            FeeSourceType::Custom => Self::Custom,
        }
    }
}

impl From<core::PaymentStatus> for PaymentStatus {
    fn from(value: core::PaymentStatus) -> Self {
        match value {
            core::PaymentStatus::Unpaid => Self::Unpaid,
            core::PaymentStatus::Partial => Self::Partial,
            core::PaymentStatus::Paid => Self::Paid,
        }
    }
}

impl From<PaymentStatus> for core::PaymentStatus {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Unpaid => Self::Unpaid,
            PaymentStatus::Partial => Self::Partial,
            PaymentStatus::Paid => Self::Paid,
        }
    }
}

impl From<core::PaymentMode> for PaymentMode {
    fn from(value: core::PaymentMode) -> Self {
        match value {
            core::PaymentMode::Upi => Self::Upi,
            core::PaymentMode::Card => Self::Card,
            core::PaymentMode::Cash => Self::Cash,
            core::PaymentMode::Bank => Self::Bank,
        }
    }
}

impl From<PaymentMode> for core::PaymentMode {
    fn from(value: PaymentMode) -> Self {
        match value {
            PaymentMode::Upi => Self::Upi,
            PaymentMode::Card => Self::Card,
            PaymentMode::Cash => Self::Cash,
            PaymentMode::Bank => Self::Bank,
        }
    }
}

impl From<PaymentOutcome> for core::PaymentOutcome {
    fn from(value: PaymentOutcome) -> Self {
        match value {
            PaymentOutcome::Success => Self::Success,
            PaymentOutcome::Failed => Self::Failed,
        }
    }
}

impl From<core::DiscountType> for DiscountType {
    fn from(value: core::DiscountType) -> Self {
        match value {
            core::DiscountType::Fixed => Self::Fixed,
            core::DiscountType::Percentage => Self::Percentage,
        }
    }
}

impl From<DiscountType> for core::DiscountType {
    fn from(value: DiscountType) -> Self {
        match value {
            DiscountType::Fixed => Self::Fixed,
            DiscountType::Percentage => Self::Percentage,
        }
    }
}

impl From<core::DiscountCategory> for DiscountCategory {
    fn from(value: core::DiscountCategory) -> Self {
        match value {
            core::DiscountCategory::Master => Self::Master,
            core::DiscountCategory::Custom => Self::Custom,
            core::DiscountCategory::System => Self::System,
        }
    }
}

impl From<DiscountCategory> for core::DiscountCategory {
    fn from(value: DiscountCategory) -> Self {
        match value {
            DiscountCategory::Master => Self::Master,
            DiscountCategory::Custom => Self::Custom,
            DiscountCategory::System => Self::System,
        }
    }
}

impl From<core::AuditAction> for AuditAction {
    fn from(value: core::AuditAction) -> Self {
        match value {
            core::AuditAction::Create => Self::Create,
            core::AuditAction::Update => Self::Update,
            core::AuditAction::Deactivate => Self::Deactivate,
        }
    }
}
