//! Fee component catalog repository.
//!
//! Tenant-scoped master list of chargeable items. Components are soft
//! deactivated, never hard-deleted, so historical template and ledger rows
//! stay resolvable.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use vidya_core::fees::{FeeError, types as core};

use super::{db_err, is_unique_violation};
use crate::entities::{fee_components, sea_orm_active_enums::FeeComponentCategory};

/// Input for creating a fee component.
#[derive(Debug, Clone)]
pub struct CreateFeeComponentInput {
    /// Display name.
    pub name: String,
    /// Short code, unique per tenant (stored uppercased).
    pub code: String,
    /// Optional description.
    pub description: Option<String>,
    /// Component category.
    pub category: core::FeeComponentCategory,
    /// Whether discounts may be granted against charges of this component.
    pub allow_discount: bool,
    /// Default mandatory flag for new template rows.
    pub is_mandatory_default: bool,
}

/// Input for partially updating a fee component.
#[derive(Debug, Clone, Default)]
pub struct UpdateFeeComponentInput {
    /// New name.
    pub name: Option<String>,
    /// New description (outer `None` leaves it unchanged).
    pub description: Option<Option<String>>,
    /// New category.
    pub category: Option<core::FeeComponentCategory>,
    /// New discountability flag.
    pub allow_discount: Option<bool>,
    /// New default mandatory flag.
    pub is_mandatory_default: Option<bool>,
    /// New active flag (false = soft delete).
    pub is_active: Option<bool>,
}

/// Fee component repository for catalog operations.
#[derive(Debug, Clone)]
pub struct FeeComponentRepository {
    db: DatabaseConnection,
}

impl FeeComponentRepository {
    /// Creates a new fee component repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a fee component.
    ///
    /// The code is trimmed, uppercased, and capped at 50 characters before
    /// the uniqueness check.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::DuplicateComponentCode` when the code already
    /// exists for the tenant.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        input: CreateFeeComponentInput,
    ) -> Result<fee_components::Model, FeeError> {
        let mut code = input.code.trim().to_uppercase();
        code.truncate(50);
        let name = input.name.trim().to_string();
        let description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let existing = fee_components::Entity::find()
            .filter(fee_components::Column::TenantId.eq(tenant_id))
            .filter(fee_components::Column::Code.eq(&code))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Err(FeeError::DuplicateComponentCode);
        }

        let now = Utc::now().into();
        let component = fee_components::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(name),
            code: Set(code),
            description: Set(description),
            category: Set(FeeComponentCategory::from(input.category)),
            allow_discount: Set(input.allow_discount),
            is_mandatory_default: Set(input.is_mandatory_default),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        component.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                FeeError::DuplicateComponentCode
            } else {
                db_err(e)
            }
        })
    }

    /// Lists fee components for a tenant, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<fee_components::Model>, FeeError> {
        let mut query =
            fee_components::Entity::find().filter(fee_components::Column::TenantId.eq(tenant_id));

        if active_only {
            query = query.filter(fee_components::Column::IsActive.eq(true));
        }

        query
            .order_by_asc(fee_components::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Gets a fee component by ID.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::ComponentNotFound` when absent or owned by
    /// another tenant.
    pub async fn get(
        &self,
        tenant_id: Uuid,
        component_id: Uuid,
    ) -> Result<fee_components::Model, FeeError> {
        fee_components::Entity::find_by_id(component_id)
            .filter(fee_components::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(FeeError::ComponentNotFound(component_id))
    }

    /// Partially updates a fee component.
    ///
    /// Setting `is_active` to false is the soft delete path.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::ComponentNotFound` when absent, or
    /// `FeeError::ComponentUpdateConflict` when the update violates the
    /// tenant code uniqueness.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        component_id: Uuid,
        input: UpdateFeeComponentInput,
    ) -> Result<fee_components::Model, FeeError> {
        let component = self.get(tenant_id, component_id).await?;

        let mut active: fee_components::ActiveModel = component.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()));
        }
        if let Some(category) = input.category {
            active.category = Set(FeeComponentCategory::from(category));
        }
        if let Some(allow_discount) = input.allow_discount {
            active.allow_discount = Set(allow_discount);
        }
        if let Some(is_mandatory_default) = input.is_mandatory_default {
            active.is_mandatory_default = Set(is_mandatory_default);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        active.update(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                FeeError::ComponentUpdateConflict
            } else {
                db_err(e)
            }
        })
    }
}
