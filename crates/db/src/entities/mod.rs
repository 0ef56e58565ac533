//! `SeaORM` entity definitions.

pub mod sea_orm_active_enums;

pub mod academic_years;
pub mod class_fee_structures;
pub mod fee_audit_logs;
pub mod fee_components;
pub mod payment_transactions;
pub mod school_classes;
pub mod sections;
pub mod student_academic_records;
pub mod student_fee_assignments;
pub mod student_fee_discounts;
pub mod students;
pub mod tenants;
