//! Fee domain types.
//!
//! Enums here mirror the Postgres enum types one-to-one; the database layer
//! converts between these and its active enums at the boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category of a chargeable fee component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeComponentCategory {
    /// Tuition and other academic charges.
    Academic,
    /// Transport charges.
    Transport,
    /// Hostel and boarding charges.
    Hostel,
    /// Anything else.
    Other,
}

/// Billing frequency of a template row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeFrequency {
    /// Charged once for the academic year.
    OneTime,
    /// Charged monthly.
    Monthly,
    /// Charged per term.
    TermWise,
}

/// Origin of a student fee assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeSourceType {
    /// Snapshotted from a class fee template row.
    Template,
    /// One-off charge entered directly for the student.
    Custom,
}

/// Derived payment status of an assignment.
///
/// Status only moves through recalculation; callers never set it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// No successful payment recorded yet.
    Unpaid,
    /// Paid in part.
    Partial,
    /// Paid in full.
    Paid,
}

/// How a payment was collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMode {
    /// UPI transfer.
    Upi,
    /// Card payment.
    Card,
    /// Cash at the counter.
    Cash,
    /// Bank transfer.
    Bank,
}

/// Outcome of a payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    /// Payment settled; counts toward the balance.
    Success,
    /// Payment failed; kept for the record, never counted.
    Failed,
}

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Absolute amount off the base.
    Fixed,
    /// Percentage of the original base amount.
    Percentage,
}

/// Administrative category of a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountCategory {
    /// From the tenant's master discount list.
    Master,
    /// Granted ad hoc for one student.
    Custom,
    /// Applied automatically by the system.
    System,
}

/// Audit trail action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A row was created.
    Create,
    /// A row's fields were updated.
    Update,
    /// A row was soft-deactivated.
    Deactivate,
}

/// Lifecycle status of an academic year (external collaborator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcademicYearStatus {
    /// Year is open; fee writes are allowed.
    Active,
    /// Year is closed; the entire fee ledger is read-only.
    Closed,
}

impl AcademicYearStatus {
    /// Returns true if fee mutations are allowed for the year.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Enrollment status of a student academic record (external collaborator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    /// Currently enrolled.
    Active,
    /// Moved to another school.
    Transferred,
    /// Withdrawn mid-year.
    Withdrawn,
}

impl EnrollmentStatus {
    /// Returns true if the enrollment supplies a current class for the student.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Authorization tier of the caller, passed explicitly into discount grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleTier {
    /// Admin-tier caller; may approve discounts above the elevation threshold.
    Admin,
    /// Every other role.
    Staff,
}

impl RoleTier {
    /// Returns true for admin-tier callers.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Derived totals of an assignment after recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentTotals {
    /// Sum of active discount amounts.
    pub total_discount: Decimal,
    /// Amount still owed overall: `max(0, base - total_discount)`.
    pub final_amount: Decimal,
    /// Sum of successful payments.
    pub total_paid: Decimal,
    /// Status derived from `total_paid` vs `final_amount`.
    pub status: PaymentStatus,
}

impl AssignmentTotals {
    /// Remaining balance after payments.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.final_amount - self.total_paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_academic_year_writability() {
        assert!(AcademicYearStatus::Active.is_writable());
        assert!(!AcademicYearStatus::Closed.is_writable());
    }

    #[test]
    fn test_enrollment_activity() {
        assert!(EnrollmentStatus::Active.is_active());
        assert!(!EnrollmentStatus::Transferred.is_active());
        assert!(!EnrollmentStatus::Withdrawn.is_active());
    }

    #[test]
    fn test_role_tier() {
        assert!(RoleTier::Admin.is_admin());
        assert!(!RoleTier::Staff.is_admin());
    }

    #[test]
    fn test_totals_balance() {
        let totals = AssignmentTotals {
            total_discount: dec!(150),
            final_amount: dec!(850),
            total_paid: dec!(400),
            status: PaymentStatus::Partial,
        };
        assert_eq!(totals.balance(), dec!(450));
    }

    #[test]
    fn test_enum_serde_spellings() {
        assert_eq!(
            serde_json::to_string(&FeeSourceType::Template).unwrap(),
            "\"TEMPLATE\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Unpaid).unwrap(),
            "\"unpaid\""
        );
        assert_eq!(serde_json::to_string(&PaymentMode::Upi).unwrap(), "\"UPI\"");
        assert_eq!(
            serde_json::to_string(&FeeFrequency::TermWise).unwrap(),
            "\"term_wise\""
        );
        assert_eq!(
            serde_json::to_string(&DiscountType::Percentage).unwrap(),
            "\"percentage\""
        );
    }
}
