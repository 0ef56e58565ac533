//! `SeaORM` Entity for class_fee_structures table.
//!
//! One row per (academic year, class, fee component): the template a
//! student assignment snapshots its base amount from.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::FeeFrequency;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "class_fee_structures")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub academic_year_id: Uuid,
    pub class_id: Uuid,
    pub fee_component_id: Uuid,
    pub amount: Decimal,
    pub frequency: FeeFrequency,
    pub due_date: Option<Date>,
    pub is_mandatory: bool,
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
        belongs_to = "super::school_classes::Entity",
        from = "Column::ClassId",
        to = "super::school_classes::Column::Id"
    )]
    SchoolClasses,
    #[sea_orm(
        belongs_to = "super::fee_components::Entity",
        from = "Column::FeeComponentId",
        to = "super::fee_components::Column::Id"
    )]
    FeeComponents,
}

impl Related<super::fee_components::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeeComponents.def()
    }
}

impl Related<super::school_classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolClasses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
