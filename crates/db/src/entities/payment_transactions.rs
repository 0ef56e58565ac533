//! `SeaORM` Entity for payment_transactions table.
//!
//! Append-only: a recorded payment is never edited or deleted. Corrections
//! are new entries. Database triggers reject UPDATE and DELETE.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PaymentMode, PaymentOutcome};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub academic_year_id: Uuid,
    pub student_fee_assignment_id: Uuid,
    pub amount_paid: Decimal,
    pub payment_mode: PaymentMode,
    pub transaction_reference: Option<String>,
    pub payment_status: PaymentOutcome,
    pub paid_at: DateTimeWithTimeZone,
    pub collected_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student_fee_assignments::Entity",
        from = "Column::StudentFeeAssignmentId",
        to = "super::student_fee_assignments::Column::Id"
    )]
    StudentFeeAssignments,
}

impl Related<super::student_fee_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentFeeAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
