//! Shared helpers for database integration tests.
//!
//! Tests run against the database named by `DATABASE_URL` and skip cleanly
//! when it is not set. Each test seeds its own tenant so reruns and
//! parallel tests never collide.

// Not every test binary uses every helper
#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use vidya_db::entities::{
    academic_years, class_fee_structures, fee_components, school_classes, sections,
    sea_orm_active_enums::{
        AcademicYearStatus, EnrollmentStatus, FeeComponentCategory, FeeFrequency,
    },
    student_academic_records, students, tenants,
};
use vidya_db::migration::Migrator;

/// Connects to the test database, running migrations first.
///
/// Returns `None` (test should pass trivially) when `DATABASE_URL` is unset.
pub async fn connect_or_skip() -> Option<DatabaseConnection> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    };
    let db = Database::connect(&url)
        .await
        .expect("failed to connect to test database");
    Migrator::up(&db, None).await.expect("migrations failed");
    Some(db)
}

/// A seeded tenant with one active year, class, section, and student.
pub struct Fixture {
    pub tenant_id: Uuid,
    pub academic_year_id: Uuid,
    pub class_id: Uuid,
    pub section_id: Uuid,
    pub student_id: Uuid,
}

/// Seeds a fresh tenant with the masters the fee engine needs.
pub async fn seed_fixture(db: &DatabaseConnection) -> Fixture {
    let now = Utc::now().into();
    let tenant_id = Uuid::new_v4();
    tenants::ActiveModel {
        id: Set(tenant_id),
        name: Set(format!("Test School {tenant_id}")),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed tenant");

    let academic_year_id = Uuid::new_v4();
    academic_years::ActiveModel {
        id: Set(academic_year_id),
        tenant_id: Set(tenant_id),
        name: Set("2026-27".to_string()),
        status: Set(AcademicYearStatus::Active),
        is_current: Set(true),
        start_date: Set(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()),
        end_date: Set(NaiveDate::from_ymd_opt(2027, 3, 31).unwrap()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed academic year");

    let class_id = Uuid::new_v4();
    school_classes::ActiveModel {
        id: Set(class_id),
        tenant_id: Set(tenant_id),
        name: Set("Grade 5".to_string()),
        display_order: Set(Some(5)),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed class");

    let section_id = Uuid::new_v4();
    sections::ActiveModel {
        id: Set(section_id),
        tenant_id: Set(tenant_id),
        class_id: Set(class_id),
        name: Set("A".to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed section");

    let student_id = Uuid::new_v4();
    students::ActiveModel {
        id: Set(student_id),
        tenant_id: Set(tenant_id),
        full_name: Set("Asha Verma".to_string()),
        admission_number: Set(Some("ADM-001".to_string())),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed student");

    student_academic_records::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        student_id: Set(student_id),
        academic_year_id: Set(academic_year_id),
        class_id: Set(class_id),
        section_id: Set(Some(section_id)),
        status: Set(EnrollmentStatus::Active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed enrollment");

    Fixture {
        tenant_id,
        academic_year_id,
        class_id,
        section_id,
        student_id,
    }
}

/// Seeds a fee component for the fixture tenant.
pub async fn seed_component(
    db: &DatabaseConnection,
    fixture: &Fixture,
    code: &str,
    allow_discount: bool,
) -> Uuid {
    let now = Utc::now().into();
    let component_id = Uuid::new_v4();
    fee_components::ActiveModel {
        id: Set(component_id),
        tenant_id: Set(fixture.tenant_id),
        name: Set(format!("{code} fee")),
        code: Set(code.to_string()),
        description: Set(None),
        category: Set(FeeComponentCategory::Academic),
        allow_discount: Set(allow_discount),
        is_mandatory_default: Set(true),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed component");
    component_id
}

/// Seeds a template row for the fixture class and year.
pub async fn seed_template(
    db: &DatabaseConnection,
    fixture: &Fixture,
    component_id: Uuid,
    amount: Decimal,
    is_mandatory: bool,
) -> Uuid {
    let now = Utc::now().into();
    let structure_id = Uuid::new_v4();
    class_fee_structures::ActiveModel {
        id: Set(structure_id),
        tenant_id: Set(fixture.tenant_id),
        academic_year_id: Set(fixture.academic_year_id),
        class_id: Set(fixture.class_id),
        fee_component_id: Set(component_id),
        amount: Set(amount),
        frequency: Set(FeeFrequency::Monthly),
        due_date: Set(None),
        is_mandatory: Set(is_mandatory),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("seed template");
    structure_id
}
