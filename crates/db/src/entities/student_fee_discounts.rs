//! `SeaORM` Entity for student_fee_discounts table.
//!
//! Soft-deactivated, never hard-deleted; only active rows count toward an
//! assignment's aggregate discount.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DiscountCategory, DiscountType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "student_fee_discounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub academic_year_id: Uuid,
    pub student_fee_assignment_id: Uuid,
    pub discount_name: String,
    pub discount_category: DiscountCategory,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub calculated_discount_amount: Decimal,
    pub reason: Option<String>,
    pub approved_by: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
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
