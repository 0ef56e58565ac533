//! Fee audit trail writer.
//!
//! Every mutating fee operation appends one row per logical change, inside
//! the same transaction as the mutation it describes.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseTransaction, DbErr, Set};
use uuid::Uuid;

use crate::entities::{fee_audit_logs, sea_orm_active_enums::AuditAction};

/// Appends one audit row inside the caller's transaction.
pub(crate) async fn log_fee_audit(
    txn: &DatabaseTransaction,
    tenant_id: Uuid,
    reference_table: &str,
    reference_id: Uuid,
    action_type: AuditAction,
    old_value: Option<serde_json::Value>,
    new_value: Option<serde_json::Value>,
    changed_by: Option<Uuid>,
) -> Result<(), DbErr> {
    let log = fee_audit_logs::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        reference_table: Set(reference_table.to_string()),
        reference_id: Set(reference_id),
        action_type: Set(action_type),
        old_value: Set(old_value),
        new_value: Set(new_value),
        changed_by: Set(changed_by),
        created_at: Set(Utc::now().into()),
    };
    log.insert(txn).await?;
    Ok(())
}
