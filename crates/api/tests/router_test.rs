//! Router-level tests: public health probe, auth rejection, and role
//! gating. These run entirely in memory with a disconnected database
//! handle; none of them reaches a query.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header::AUTHORIZATION};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use tower::ServiceExt;
use uuid::Uuid;

use vidya_api::{AppState, create_router};
use vidya_shared::{FeesConfig, JwtConfig, JwtService};

fn test_state() -> AppState {
    AppState {
        db: Arc::new(DatabaseConnection::Disconnected),
        jwt_service: Arc::new(JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_minutes: 15,
        })),
        fees: FeesConfig::default(),
    }
}

fn bearer(state: &AppState, role: &str) -> String {
    let token = state
        .jwt_service
        .generate_access_token(Uuid::new_v4(), Uuid::new_v4(), role)
        .expect("token");
    format!("Bearer {token}")
}

#[tokio::test]
async fn test_health_is_public() {
    let app = create_router(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_rejects_missing_token() {
    let app = create_router(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/fee-components")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.into_body().collect().await.expect("body").to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["error"], "missing_token");
}

#[tokio::test]
async fn test_protected_route_rejects_garbage_token() {
    let app = create_router(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/fee-components")
                .header(AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_catalog_write_requires_admin_tier() {
    let state = test_state();
    let auth = bearer(&state, "TEACHER");
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/fee-components")
                .header(AUTHORIZATION, auth)
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"name":"Tuition","code":"TUITION","category":"ACADEMIC","allow_discount":true,"is_mandatory_default":true}"#,
                ))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
