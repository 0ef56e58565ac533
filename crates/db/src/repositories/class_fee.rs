//! Class fee template repository.
//!
//! A template row defines what one class is charged for one component in
//! one academic year. Assigning fees to a student snapshots the template
//! amount; editing a template later never touches existing assignments.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use vidya_core::fees::{FeeError, FeeService, types as core};

use super::audit::log_fee_audit;
use super::{db_err, is_unique_violation};
use crate::entities::{
    academic_years, class_fee_structures, fee_components, school_classes,
    sea_orm_active_enums::{AuditAction, FeeFrequency},
};

/// Input for creating a class fee template row.
#[derive(Debug, Clone)]
pub struct CreateClassFeeInput {
    /// Academic year the template applies to.
    pub academic_year_id: Uuid,
    /// Class being charged.
    pub class_id: Uuid,
    /// Fee component being charged.
    pub fee_component_id: Uuid,
    /// Charge amount (non-negative).
    pub amount: Decimal,
    /// Billing frequency.
    pub frequency: core::FeeFrequency,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Whether every enrolled student is auto-assigned this charge.
    pub is_mandatory: bool,
}

/// One template row joined with its component's display fields.
#[derive(Debug, Clone)]
pub struct ClassFeeItem {
    /// Template row.
    pub structure: class_fee_structures::Model,
    /// Component display name.
    pub fee_component_name: String,
    /// Component code.
    pub fee_component_code: String,
}

/// All template rows of one class for an academic year.
#[derive(Debug, Clone)]
pub struct ClassFeesByClass {
    /// Academic year.
    pub academic_year_id: Uuid,
    /// Class.
    pub class_id: Uuid,
    /// Class display name.
    pub class_name: String,
    /// Template rows with component details.
    pub items: Vec<ClassFeeItem>,
}

/// Class fee template repository.
#[derive(Debug, Clone)]
pub struct ClassFeeRepository {
    db: DatabaseConnection,
}

impl ClassFeeRepository {
    /// Creates a new class fee repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a class fee template row.
    ///
    /// Preconditions: the academic year exists for the tenant and is still
    /// ACTIVE, the class belongs to the tenant, and the fee component is
    /// active in the tenant.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::DuplicateTemplate` when a row already exists for
    /// (year, class, component); validation errors otherwise.
    pub async fn create_structure(
        &self,
        tenant_id: Uuid,
        input: CreateClassFeeInput,
        changed_by: Option<Uuid>,
    ) -> Result<class_fee_structures::Model, FeeError> {
        let year = academic_years::Entity::find_by_id(input.academic_year_id)
            .filter(academic_years::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(FeeError::InvalidYear(input.academic_year_id))?;
        if !core::AcademicYearStatus::from(year.status).is_writable() {
            return Err(FeeError::YearClosed);
        }

        school_classes::Entity::find_by_id(input.class_id)
            .filter(school_classes::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(FeeError::InvalidClass(input.class_id))?;

        fee_components::Entity::find_by_id(input.fee_component_id)
            .filter(fee_components::Column::TenantId.eq(tenant_id))
            .filter(fee_components::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(FeeError::InvalidComponent(input.fee_component_id))?;

        FeeService::validate_charge_amount(input.amount)?;

        let existing = class_fee_structures::Entity::find()
            .filter(class_fee_structures::Column::AcademicYearId.eq(input.academic_year_id))
            .filter(class_fee_structures::Column::ClassId.eq(input.class_id))
            .filter(class_fee_structures::Column::FeeComponentId.eq(input.fee_component_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Err(FeeError::DuplicateTemplate);
        }

        let txn = self.db.begin().await.map_err(db_err)?;

        let now = Utc::now().into();
        let structure = class_fee_structures::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            academic_year_id: Set(input.academic_year_id),
            class_id: Set(input.class_id),
            fee_component_id: Set(input.fee_component_id),
            amount: Set(input.amount),
            frequency: Set(FeeFrequency::from(input.frequency)),
            due_date: Set(input.due_date),
            is_mandatory: Set(input.is_mandatory),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let structure = structure.insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                FeeError::DuplicateTemplate
            } else {
                db_err(e)
            }
        })?;

        log_fee_audit(
            &txn,
            tenant_id,
            "class_fee_structures",
            structure.id,
            AuditAction::Create,
            None,
            Some(json!({
                "amount": input.amount.to_string(),
                "frequency": input.frequency,
                "class_id": input.class_id.to_string(),
                "fee_component_id": input.fee_component_id.to_string(),
            })),
            changed_by,
        )
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(structure)
    }

    /// Lists active template rows for an academic year, optionally scoped
    /// to one class, ordered by class then component.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        academic_year_id: Uuid,
        class_id: Option<Uuid>,
    ) -> Result<Vec<class_fee_structures::Model>, FeeError> {
        let mut query = class_fee_structures::Entity::find()
            .filter(class_fee_structures::Column::TenantId.eq(tenant_id))
            .filter(class_fee_structures::Column::AcademicYearId.eq(academic_year_id))
            .filter(class_fee_structures::Column::IsActive.eq(true));

        if let Some(class_id) = class_id {
            query = query.filter(class_fee_structures::Column::ClassId.eq(class_id));
        }

        query
            .order_by_asc(class_fee_structures::Column::ClassId)
            .order_by_asc(class_fee_structures::Column::FeeComponentId)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists an academic year's template rows grouped per class, joined
    /// with class and component display fields. Used by admin review
    /// screens.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list_grouped_by_class(
        &self,
        tenant_id: Uuid,
        academic_year_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<ClassFeesByClass>, FeeError> {
        let mut query = class_fee_structures::Entity::find()
            .filter(class_fee_structures::Column::TenantId.eq(tenant_id))
            .filter(class_fee_structures::Column::AcademicYearId.eq(academic_year_id));
        if active_only {
            query = query.filter(class_fee_structures::Column::IsActive.eq(true));
        }
        let structures = query.all(&self.db).await.map_err(db_err)?;

        let class_ids: Vec<Uuid> = structures.iter().map(|s| s.class_id).collect();
        let classes: HashMap<Uuid, school_classes::Model> = school_classes::Entity::find()
            .filter(school_classes::Column::Id.is_in(class_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let component_ids: Vec<Uuid> = structures.iter().map(|s| s.fee_component_id).collect();
        let mut components_query =
            fee_components::Entity::find().filter(fee_components::Column::Id.is_in(component_ids));
        if active_only {
            components_query =
                components_query.filter(fee_components::Column::IsActive.eq(true));
        }
        let components: HashMap<Uuid, fee_components::Model> = components_query
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut grouped: HashMap<Uuid, ClassFeesByClass> = HashMap::new();
        for structure in structures {
            let Some(class) = classes.get(&structure.class_id) else {
                continue;
            };
            let Some(component) = components.get(&structure.fee_component_id) else {
                continue;
            };

            let entry = grouped
                .entry(structure.class_id)
                .or_insert_with(|| ClassFeesByClass {
                    academic_year_id,
                    class_id: structure.class_id,
                    class_name: class.name.clone(),
                    items: Vec::new(),
                });
            entry.items.push(ClassFeeItem {
                structure,
                fee_component_name: component.name.clone(),
                fee_component_code: component.code.clone(),
            });
        }

        let mut result: Vec<ClassFeesByClass> = grouped.into_values().collect();
        for group in &mut result {
            group
                .items
                .sort_by(|a, b| a.fee_component_name.cmp(&b.fee_component_name));
        }
        // Classes in display order when set, then by name
        result.sort_by(|a, b| {
            let a_class = classes.get(&a.class_id);
            let b_class = classes.get(&b.class_id);
            let a_key = (
                a_class.and_then(|c| c.display_order).unwrap_or(i32::MAX),
                a.class_name.clone(),
            );
            let b_key = (
                b_class.and_then(|c| c.display_order).unwrap_or(i32::MAX),
                b.class_name.clone(),
            );
            a_key.cmp(&b_key)
        });

        Ok(result)
    }
}
