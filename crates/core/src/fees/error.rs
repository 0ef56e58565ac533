//! Fee engine error types.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during fee operations.
#[derive(Debug, Error)]
pub enum FeeError {
    // ========== Validation Errors ==========
    /// Fee amount cannot be negative.
    #[error("Fee amount cannot be negative")]
    NegativeAmount,

    /// Payment amount must be positive.
    #[error("Payment amount must be positive")]
    NonPositivePayment,

    /// Custom charge name cannot be empty.
    #[error("Custom charge name cannot be empty")]
    EmptyChargeName,

    // ========== Referenced-Entity Errors ==========
    /// Academic year missing or not visible to the tenant.
    #[error("Invalid academic year: {0}")]
    InvalidYear(Uuid),

    /// Academic year is closed; the fee ledger is read-only.
    #[error("Academic year is closed; fee records cannot be modified")]
    YearClosed,

    /// Class missing or not visible to the tenant.
    #[error("Invalid class: {0}")]
    InvalidClass(Uuid),

    /// Fee component missing, inactive, or not visible to the tenant.
    #[error("Invalid fee component: {0}")]
    InvalidComponent(Uuid),

    /// Student missing or not visible to the tenant.
    #[error("Invalid student: {0}")]
    InvalidStudent(Uuid),

    /// Student has no active enrollment for the academic year.
    #[error("Student not enrolled for this academic year")]
    NotEnrolled,

    // ========== Catalog Errors ==========
    /// Fee component not found.
    #[error("Fee component not found: {0}")]
    ComponentNotFound(Uuid),

    /// Fee component code already exists for the tenant.
    #[error("Fee component code already exists for this tenant")]
    DuplicateComponentCode,

    /// Fee component update conflicts with an existing row.
    #[error("Fee component update conflict")]
    ComponentUpdateConflict,

    // ========== Template Errors ==========
    /// A template row already exists for (year, class, component).
    #[error("This class already has this fee component for this academic year")]
    DuplicateTemplate,

    /// No template rows defined for the student's class and year.
    #[error("No fee structure defined for this class")]
    NoTemplatesForClass,

    /// Selected optional row is not part of the student's class fee structure.
    #[error("Invalid optional component selection: {0}")]
    InvalidOptionalSelection(Uuid),

    // ========== Assignment Errors ==========
    /// Student fee assignment not found or inactive.
    #[error("Student fee assignment not found: {0}")]
    AssignmentNotFound(Uuid),

    /// An active assignment already exists for this template and student.
    #[error("Fee already assigned to this student")]
    DuplicateAssignment,

    // ========== Discount Errors ==========
    /// Discount not found.
    #[error("Discount not found: {0}")]
    DiscountNotFound(Uuid),

    /// The originating component does not allow discounts.
    #[error("Discounts are not allowed for this fee component")]
    DiscountNotAllowed,

    /// Percentage discount above the elevation threshold needs admin approval.
    #[error("Only an admin can approve a discount greater than {threshold}%")]
    DiscountRequiresElevation {
        /// Requested percentage value.
        value: Decimal,
        /// Configured elevation threshold.
        threshold: Decimal,
    },

    /// Total discount would exceed the original amount.
    #[error("Total discount cannot exceed original amount")]
    OverDiscount {
        /// Discount amount requested.
        requested: Decimal,
        /// Discount headroom still available.
        available: Decimal,
    },

    // ========== Payment Errors ==========
    /// Payment would exceed the remaining balance.
    #[error("Payment amount cannot exceed remaining balance")]
    Overpayment {
        /// Payment amount requested.
        requested: Decimal,
        /// Remaining balance.
        balance: Decimal,
    },

    // ========== Infrastructure Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FeeError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::NonPositivePayment => "NON_POSITIVE_PAYMENT",
            Self::EmptyChargeName => "EMPTY_CHARGE_NAME",
            Self::InvalidYear(_) => "INVALID_ACADEMIC_YEAR",
            Self::YearClosed => "ACADEMIC_YEAR_CLOSED",
            Self::InvalidClass(_) => "INVALID_CLASS",
            Self::InvalidComponent(_) => "INVALID_FEE_COMPONENT",
            Self::InvalidStudent(_) => "INVALID_STUDENT",
            Self::NotEnrolled => "NOT_ENROLLED",
            Self::ComponentNotFound(_) => "FEE_COMPONENT_NOT_FOUND",
            Self::DuplicateComponentCode => "DUPLICATE_COMPONENT_CODE",
            Self::ComponentUpdateConflict => "COMPONENT_UPDATE_CONFLICT",
            Self::DuplicateTemplate => "DUPLICATE_TEMPLATE",
            Self::NoTemplatesForClass => "NO_TEMPLATES_FOR_CLASS",
            Self::InvalidOptionalSelection(_) => "INVALID_OPTIONAL_SELECTION",
            Self::AssignmentNotFound(_) => "ASSIGNMENT_NOT_FOUND",
            Self::DuplicateAssignment => "DUPLICATE_ASSIGNMENT",
            Self::DiscountNotFound(_) => "DISCOUNT_NOT_FOUND",
            Self::DiscountNotAllowed => "DISCOUNT_NOT_ALLOWED",
            Self::DiscountRequiresElevation { .. } => "DISCOUNT_REQUIRES_ELEVATION",
            Self::OverDiscount { .. } => "OVER_DISCOUNT",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation and lifecycle errors
            Self::NegativeAmount
            | Self::NonPositivePayment
            | Self::EmptyChargeName
            | Self::InvalidYear(_)
            | Self::YearClosed
            | Self::InvalidClass(_)
            | Self::InvalidComponent(_)
            | Self::InvalidStudent(_)
            | Self::NotEnrolled
            | Self::NoTemplatesForClass
            | Self::InvalidOptionalSelection(_)
            | Self::DiscountNotAllowed
            | Self::OverDiscount { .. }
            | Self::Overpayment { .. } => 400,

            // 403 Forbidden - authority errors
            Self::DiscountRequiresElevation { .. } => 403,

            // 404 Not Found
            Self::ComponentNotFound(_)
            | Self::AssignmentNotFound(_)
            | Self::DiscountNotFound(_) => 404,

            // 409 Conflict - uniqueness violations
            Self::DuplicateComponentCode
            | Self::ComponentUpdateConflict
            | Self::DuplicateTemplate
            | Self::DuplicateAssignment => 409,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(FeeError::NegativeAmount.error_code(), "NEGATIVE_AMOUNT");
        assert_eq!(FeeError::YearClosed.error_code(), "ACADEMIC_YEAR_CLOSED");
        assert_eq!(
            FeeError::DuplicateTemplate.error_code(),
            "DUPLICATE_TEMPLATE"
        );
        assert_eq!(
            FeeError::Overpayment {
                requested: dec!(100),
                balance: dec!(50),
            }
            .error_code(),
            "OVERPAYMENT"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(FeeError::NegativeAmount.http_status_code(), 400);
        assert_eq!(FeeError::YearClosed.http_status_code(), 400);
        assert_eq!(
            FeeError::DiscountRequiresElevation {
                value: dec!(25),
                threshold: dec!(20),
            }
            .http_status_code(),
            403
        );
        assert_eq!(
            FeeError::AssignmentNotFound(Uuid::nil()).http_status_code(),
            404
        );
        assert_eq!(FeeError::DuplicateTemplate.http_status_code(), 409);
        assert_eq!(
            FeeError::Database("boom".to_string()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_error_display() {
        let err = FeeError::DiscountRequiresElevation {
            value: dec!(25),
            threshold: dec!(20),
        };
        assert_eq!(
            err.to_string(),
            "Only an admin can approve a discount greater than 20%"
        );

        let err = FeeError::Overpayment {
            requested: dec!(500),
            balance: dec!(100),
        };
        assert_eq!(
            err.to_string(),
            "Payment amount cannot exceed remaining balance"
        );
    }
}
