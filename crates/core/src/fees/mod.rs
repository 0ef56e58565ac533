//! Fee lifecycle engine.
//!
//! Class-level templates are snapshotted into per-student assignments;
//! discounts and payments mutate ledgers attached to an assignment and the
//! recalculation rules here derive its totals and payment status.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::FeeError;
pub use service::{DiscountPolicy, FeeService};
pub use types::{
    AcademicYearStatus, AssignmentTotals, AuditAction, DiscountCategory, DiscountType,
    EnrollmentStatus, FeeComponentCategory, FeeFrequency, FeeSourceType, PaymentMode,
    PaymentOutcome, PaymentStatus, RoleTier,
};
