//! `SeaORM` Entity for student_fee_assignments table.
//!
//! The ledger head: a frozen `base_amount` snapshot plus live recomputed
//! `total_discount`, `final_amount`, and `status`. The base amount never
//! changes after creation; a database trigger backs that up.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{FeeSourceType, PaymentStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "student_fee_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub academic_year_id: Uuid,
    pub student_id: Uuid,
    pub source_type: FeeSourceType,
    pub class_fee_structure_id: Option<Uuid>,
    pub custom_name: Option<String>,
    pub base_amount: Decimal,
    pub total_discount: Decimal,
    pub final_amount: Decimal,
    pub status: PaymentStatus,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::academic_years::Entity",
        from = "Column::AcademicYearId",
        to = "super::academic_years::Column::Id"
    )]
    AcademicYears,
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Students,
    #[sea_orm(
        belongs_to = "super::class_fee_structures::Entity",
        from = "Column::ClassFeeStructureId",
        to = "super::class_fee_structures::Column::Id"
    )]
    ClassFeeStructures,
    #[sea_orm(has_many = "super::student_fee_discounts::Entity")]
    StudentFeeDiscounts,
    #[sea_orm(has_many = "super::payment_transactions::Entity")]
    PaymentTransactions,
}

impl Related<super::student_fee_discounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentFeeDiscounts.def()
    }
}

impl Related<super::payment_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentTransactions.def()
    }
}

impl Related<super::class_fee_structures::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClassFeeStructures.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
