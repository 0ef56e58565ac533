//! Demo data seeder for local development.
//!
//! Seeds one tenant with an active academic year, two classes with
//! sections, a handful of enrolled students, the common fee components,
//! and template rows for each class. Prints an admin JWT for poking the
//! API locally.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing::info;
use uuid::Uuid;

use vidya_db::entities::{
    academic_years, class_fee_structures, fee_components, school_classes, sections,
    sea_orm_active_enums::{
        AcademicYearStatus, EnrollmentStatus, FeeComponentCategory, FeeFrequency,
    },
    student_academic_records, students, tenants,
};
use vidya_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("seeder=info").init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = vidya_db::connect(&config.database.url).await?;

    let now = Utc::now().into();
    let tenant_id = Uuid::new_v4();
    tenants::ActiveModel {
        id: Set(tenant_id),
        name: Set("Sunrise Public School".to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await?;
    info!(%tenant_id, "seeded tenant");

    let academic_year_id = Uuid::new_v4();
    academic_years::ActiveModel {
        id: Set(academic_year_id),
        tenant_id: Set(tenant_id),
        name: Set("2026-27".to_string()),
        status: Set(AcademicYearStatus::Active),
        is_current: Set(true),
        start_date: Set(date(2026, 4, 1)),
        end_date: Set(date(2027, 3, 31)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await?;

    let components = [
        ("Tuition Fee", "TUITION", FeeComponentCategory::Academic, true, true),
        ("Transport Fee", "TRANSPORT", FeeComponentCategory::Transport, true, false),
        ("Hostel Fee", "HOSTEL", FeeComponentCategory::Hostel, false, false),
        ("Exam Fee", "EXAM", FeeComponentCategory::Academic, false, true),
    ];
    let mut component_ids = Vec::new();
    for (name, code, category, allow_discount, mandatory) in components {
        let id = Uuid::new_v4();
        fee_components::ActiveModel {
            id: Set(id),
            tenant_id: Set(tenant_id),
            name: Set(name.to_string()),
            code: Set(code.to_string()),
            description: Set(None),
            category: Set(category),
            allow_discount: Set(allow_discount),
            is_mandatory_default: Set(mandatory),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await?;
        component_ids.push((id, mandatory));
    }
    info!(count = component_ids.len(), "seeded fee components");

    let amounts: [Decimal; 4] = [dec!(2500.00), dec!(800.00), dec!(4000.00), dec!(350.00)];
    for (class_index, class_name) in ["Grade 5", "Grade 6"].iter().enumerate() {
        let class_id = Uuid::new_v4();
        school_classes::ActiveModel {
            id: Set(class_id),
            tenant_id: Set(tenant_id),
            name: Set((*class_name).to_string()),
            display_order: Set(Some(i32::try_from(class_index)? + 5)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await?;

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
        .insert(&db)
        .await?;

        for ((component_id, mandatory), amount) in component_ids.iter().zip(amounts) {
            class_fee_structures::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(tenant_id),
                academic_year_id: Set(academic_year_id),
                class_id: Set(class_id),
                fee_component_id: Set(*component_id),
                amount: Set(amount),
                frequency: Set(FeeFrequency::Monthly),
                due_date: Set(Some(date(2026, 4, 10))),
                is_mandatory: Set(*mandatory),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&db)
            .await?;
        }

        seed_students(
            &db,
            tenant_id,
            academic_year_id,
            class_id,
            section_id,
            class_index,
        )
        .await?;
        info!(class = class_name, "seeded class with templates and students");
    }

    // Admin token for poking the API locally
    let jwt = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    });
    let token = jwt.generate_access_token(Uuid::new_v4(), tenant_id, "ADMIN")?;
    info!("admin token: {token}");

    Ok(())
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid seed date")
}

async fn seed_students(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    academic_year_id: Uuid,
    class_id: Uuid,
    section_id: Uuid,
    class_index: usize,
) -> anyhow::Result<()> {
    let now = Utc::now().into();
    let names = ["Asha Verma", "Rohan Iyer", "Meera Pillai"];
    for (student_index, name) in names.iter().enumerate() {
        let student_id = Uuid::new_v4();
        students::ActiveModel {
            id: Set(student_id),
            tenant_id: Set(tenant_id),
            full_name: Set((*name).to_string()),
            admission_number: Set(Some(format!(
                "ADM-{}{:03}",
                class_index + 1,
                student_index + 1
            ))),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

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
        .await?;
    }
    Ok(())
}
