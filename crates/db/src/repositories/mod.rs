//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Every mutating method owns a single database transaction: all writes
//! (rows plus their audit entries) commit together or not at all.

pub mod audit;
pub mod class_fee;
pub mod fee_component;
pub mod student_fee;

pub use class_fee::{ClassFeeItem, ClassFeeRepository, ClassFeesByClass, CreateClassFeeInput};
pub use fee_component::{CreateFeeComponentInput, FeeComponentRepository, UpdateFeeComponentInput};
pub use student_fee::{
    AddCustomFeeInput, AddDiscountInput, AssignTemplateFeesInput, AssignmentWithDetails,
    FeeReportRow, OptionalComponentSelection, RecordPaymentInput, StudentFeeRepository,
};

use sea_orm::{DbErr, SqlErr};
use vidya_core::fees::FeeError;

/// Maps a database error onto the fee engine's error type.
pub(crate) fn db_err(err: DbErr) -> FeeError {
    FeeError::Database(err.to_string())
}

/// Returns true when the error is a unique-constraint violation.
///
/// Application-level duplicate checks can race; the database constraint is
/// the backstop and its violation is remapped to a conflict error instead
/// of surfacing a raw storage error.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
