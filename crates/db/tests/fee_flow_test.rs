//! End-to-end integration tests for the fee lifecycle.
//!
//! Requires `DATABASE_URL`; each test passes trivially when it is unset.

mod common;

use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use vidya_core::fees::{DiscountPolicy, FeeError, types as core};
use vidya_db::entities::{fee_audit_logs, sea_orm_active_enums::PaymentStatus};
use vidya_db::repositories::student_fee::{
    AddCustomFeeInput, AddDiscountInput, AssignTemplateFeesInput, RecordPaymentInput,
    StudentFeeRepository,
};

use common::{connect_or_skip, seed_component, seed_fixture, seed_template};

fn assign_input(year: Uuid) -> AssignTemplateFeesInput {
    AssignTemplateFeesInput {
        academic_year_id: year,
        optional_components: vec![],
    }
}

fn discount_input(discount_type: core::DiscountType, value: rust_decimal::Decimal) -> AddDiscountInput {
    AddDiscountInput {
        discount_name: "Sibling discount".to_string(),
        discount_category: core::DiscountCategory::Custom,
        discount_type,
        discount_value: value,
        reason: None,
    }
}

fn payment_input(amount: rust_decimal::Decimal) -> RecordPaymentInput {
    RecordPaymentInput {
        amount_paid: amount,
        payment_mode: core::PaymentMode::Upi,
        transaction_reference: None,
        paid_at: None,
    }
}

#[tokio::test]
async fn test_assignment_snapshot_and_idempotent_reassignment() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fixture = seed_fixture(&db).await;
    let component_id = seed_component(&db, &fixture, "TUITION", true).await;
    seed_template(&db, &fixture, component_id, dec!(1000), true).await;

    let repo = StudentFeeRepository::new(db.clone());
    let created = repo
        .assign_template_fees(
            fixture.tenant_id,
            fixture.student_id,
            assign_input(fixture.academic_year_id),
            None,
        )
        .await
        .expect("assign template fees");

    assert_eq!(created.len(), 1);
    let assignment = &created[0];
    assert_eq!(assignment.base_amount, dec!(1000));
    assert_eq!(assignment.final_amount, dec!(1000));
    assert_eq!(assignment.total_discount, dec!(0));
    assert_eq!(assignment.status, PaymentStatus::Unpaid);

    // Second call creates nothing new for mandatory rows
    let again = repo
        .assign_template_fees(
            fixture.tenant_id,
            fixture.student_id,
            assign_input(fixture.academic_year_id),
            None,
        )
        .await
        .expect("re-assign template fees");
    assert!(again.is_empty());

    let fees = repo
        .get_student_fees(fixture.tenant_id, fixture.student_id, None)
        .await
        .expect("get student fees");
    assert_eq!(fees.len(), 1);
    assert_eq!(fees[0].fee_component_name.as_deref(), Some("TUITION fee"));
    assert_eq!(fees[0].class_name.as_deref(), Some("Grade 5"));
}

#[tokio::test]
async fn test_discount_payment_lifecycle() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fixture = seed_fixture(&db).await;
    let component_id = seed_component(&db, &fixture, "TUITION", true).await;
    seed_template(&db, &fixture, component_id, dec!(1000), true).await;

    let repo = StudentFeeRepository::new(db.clone());
    let policy = DiscountPolicy::default();
    let created = repo
        .assign_template_fees(
            fixture.tenant_id,
            fixture.student_id,
            assign_input(fixture.academic_year_id),
            None,
        )
        .await
        .expect("assign");
    let assignment_id = created[0].id;

    // 15% of 1000 = 150 off, final 850, still unpaid
    let discount = repo
        .add_discount(
            fixture.tenant_id,
            assignment_id,
            discount_input(core::DiscountType::Percentage, dec!(15)),
            None,
            core::RoleTier::Staff,
            &policy,
        )
        .await
        .expect("add discount");
    assert_eq!(discount.calculated_discount_amount, dec!(150.00));

    let fees = repo
        .get_student_fees(fixture.tenant_id, fixture.student_id, None)
        .await
        .expect("get fees");
    assert_eq!(fees[0].assignment.total_discount, dec!(150.00));
    assert_eq!(fees[0].assignment.final_amount, dec!(850.00));
    assert_eq!(fees[0].assignment.status, PaymentStatus::Unpaid);

    // Partial payment of 400 leaves a 450 balance
    repo.record_payment(
        fixture.tenant_id,
        assignment_id,
        payment_input(dec!(400)),
        None,
        None,
    )
    .await
    .expect("partial payment");

    // Deactivating the discount restores final 1000 and keeps the 400 paid
    repo.deactivate_discount(fixture.tenant_id, discount.id, None)
        .await
        .expect("deactivate discount");
    let fees = repo
        .get_student_fees(fixture.tenant_id, fixture.student_id, None)
        .await
        .expect("get fees");
    assert_eq!(fees[0].assignment.final_amount, dec!(1000.00));
    assert_eq!(fees[0].assignment.status, PaymentStatus::Partial);

    // Settling the remaining 600 completes the assignment
    repo.record_payment(
        fixture.tenant_id,
        assignment_id,
        payment_input(dec!(600)),
        None,
        None,
    )
    .await
    .expect("final payment");
    let fees = repo
        .get_student_fees(fixture.tenant_id, fixture.student_id, None)
        .await
        .expect("get fees");
    assert_eq!(fees[0].assignment.status, PaymentStatus::Paid);

    // Balance is zero now; any further payment is rejected
    let overpay = repo
        .record_payment(
            fixture.tenant_id,
            assignment_id,
            payment_input(dec!(0.01)),
            None,
            None,
        )
        .await;
    assert!(matches!(overpay, Err(FeeError::Overpayment { .. })));

    let history = repo
        .get_payment_history(fixture.tenant_id, fixture.student_id, None)
        .await
        .expect("history");
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_high_discount_requires_admin_tier() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fixture = seed_fixture(&db).await;
    let component_id = seed_component(&db, &fixture, "TUITION", true).await;
    seed_template(&db, &fixture, component_id, dec!(1000), true).await;

    let repo = StudentFeeRepository::new(db.clone());
    let policy = DiscountPolicy::default();
    let created = repo
        .assign_template_fees(
            fixture.tenant_id,
            fixture.student_id,
            assign_input(fixture.academic_year_id),
            None,
        )
        .await
        .expect("assign");
    let assignment_id = created[0].id;

    let denied = repo
        .add_discount(
            fixture.tenant_id,
            assignment_id,
            discount_input(core::DiscountType::Percentage, dec!(25)),
            None,
            core::RoleTier::Staff,
            &policy,
        )
        .await;
    assert!(matches!(
        denied,
        Err(FeeError::DiscountRequiresElevation { .. })
    ));

    // Totals untouched by the failed grant
    let fees = repo
        .get_student_fees(fixture.tenant_id, fixture.student_id, None)
        .await
        .expect("get fees");
    assert_eq!(fees[0].assignment.total_discount, dec!(0));

    let approved = repo
        .add_discount(
            fixture.tenant_id,
            assignment_id,
            discount_input(core::DiscountType::Percentage, dec!(25)),
            None,
            core::RoleTier::Admin,
            &policy,
        )
        .await
        .expect("admin discount");
    assert_eq!(approved.calculated_discount_amount, dec!(250.00));
}

#[tokio::test]
async fn test_discount_disallowed_component() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fixture = seed_fixture(&db).await;
    let component_id = seed_component(&db, &fixture, "EXAM", false).await;
    seed_template(&db, &fixture, component_id, dec!(500), true).await;

    let repo = StudentFeeRepository::new(db.clone());
    let created = repo
        .assign_template_fees(
            fixture.tenant_id,
            fixture.student_id,
            assign_input(fixture.academic_year_id),
            None,
        )
        .await
        .expect("assign");

    let denied = repo
        .add_discount(
            fixture.tenant_id,
            created[0].id,
            discount_input(core::DiscountType::Fixed, dec!(50)),
            None,
            core::RoleTier::Admin,
            &DiscountPolicy::default(),
        )
        .await;
    assert!(matches!(denied, Err(FeeError::DiscountNotAllowed)));
}

#[tokio::test]
async fn test_custom_fee_and_report() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fixture = seed_fixture(&db).await;

    let repo = StudentFeeRepository::new(db.clone());
    let assignment = repo
        .add_custom_fee(
            fixture.tenant_id,
            fixture.student_id,
            AddCustomFeeInput {
                academic_year_id: fixture.academic_year_id,
                custom_name: "Lab breakage".to_string(),
                amount: dec!(250),
                reason: Some("Broken beaker".to_string()),
            },
            None,
        )
        .await
        .expect("add custom fee");
    assert_eq!(assignment.base_amount, dec!(250));

    repo.record_payment(
        fixture.tenant_id,
        assignment.id,
        payment_input(dec!(100)),
        None,
        None,
    )
    .await
    .expect("payment");

    let report = repo
        .get_fee_report(fixture.tenant_id, fixture.academic_year_id, None, None)
        .await
        .expect("report");
    assert_eq!(report.len(), 1);
    let row = &report[0];
    assert_eq!(row.fee_component_name.as_deref(), Some("Lab breakage"));
    assert_eq!(row.student_name.as_deref(), Some("Asha Verma"));
    assert_eq!(row.class_name.as_deref(), Some("Grade 5"));
    assert_eq!(row.section_name.as_deref(), Some("A"));
    assert_eq!(row.amount_paid, dec!(100));
    assert_eq!(row.balance, dec!(150));
    assert_eq!(row.status, core::PaymentStatus::Partial);

    // Status filter excludes the partially paid row
    let unpaid_only = repo
        .get_fee_report(
            fixture.tenant_id,
            fixture.academic_year_id,
            None,
            Some(core::PaymentStatus::Unpaid),
        )
        .await
        .expect("filtered report");
    assert!(unpaid_only.is_empty());
}

#[tokio::test]
async fn test_every_mutation_writes_audit_rows() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fixture = seed_fixture(&db).await;
    let component_id = seed_component(&db, &fixture, "TUITION", true).await;
    seed_template(&db, &fixture, component_id, dec!(1000), true).await;

    let repo = StudentFeeRepository::new(db.clone());
    let created = repo
        .assign_template_fees(
            fixture.tenant_id,
            fixture.student_id,
            assign_input(fixture.academic_year_id),
            None,
        )
        .await
        .expect("assign");
    let assignment_id = created[0].id;

    repo.add_discount(
        fixture.tenant_id,
        assignment_id,
        discount_input(core::DiscountType::Fixed, dec!(100)),
        None,
        core::RoleTier::Staff,
        &DiscountPolicy::default(),
    )
    .await
    .expect("discount");

    repo.record_payment(
        fixture.tenant_id,
        assignment_id,
        payment_input(dec!(900)),
        None,
        None,
    )
    .await
    .expect("payment");

    // assignment CREATE + (discount CREATE + assignment UPDATE)
    // + (payment CREATE + assignment UPDATE)
    let audit_rows = fee_audit_logs::Entity::find()
        .filter(fee_audit_logs::Column::TenantId.eq(fixture.tenant_id))
        .all(&db)
        .await
        .expect("audit rows");
    assert_eq!(audit_rows.len(), 5);
}

#[tokio::test]
async fn test_tenant_isolation_on_reads() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fixture = seed_fixture(&db).await;
    let other = seed_fixture(&db).await;
    let component_id = seed_component(&db, &fixture, "TUITION", true).await;
    seed_template(&db, &fixture, component_id, dec!(1000), true).await;

    let repo = StudentFeeRepository::new(db.clone());
    repo.assign_template_fees(
        fixture.tenant_id,
        fixture.student_id,
        assign_input(fixture.academic_year_id),
        None,
    )
    .await
    .expect("assign");

    // The other tenant sees nothing of this student's ledger
    let foreign = repo
        .get_student_fees(other.tenant_id, fixture.student_id, None)
        .await
        .expect("cross-tenant read");
    assert!(foreign.is_empty());
}
