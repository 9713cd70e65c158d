mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

// ── Health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    common::cleanup(app).await;
}

// ── Registration & Auth ─────────────────────────────────────────

#[tokio::test]
async fn register_bootstrap_admin() {
    let app = common::spawn_app().await;

    let (body, status) = app.register(common::ADMIN_EMAIL, common::PASSWORD, "Admin").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["access_token"].is_string());
    assert!(body["data"]["refresh_token"].is_string());
    assert_eq!(body["data"]["user"]["roles"], json!(["admin"]));

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_second_user() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (body, status) = app.register("other@test.com", common::PASSWORD, "Other").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("disabled"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn register_rejects_short_password() {
    let app = common::spawn_app().await;

    let (_, status) = app.register(common::ADMIN_EMAIL, "short", "Admin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn login_valid_and_invalid_credentials() {
    let app = common::spawn_app().await;
    app.bootstrap().await;

    let (body, status) = app.login(common::ADMIN_EMAIL, common::PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["access_token"].is_string());

    let (body, status) = app.login(common::ADMIN_EMAIL, "wrongpassword").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (_, status) = app.login("nobody@test.com", common::PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn me_returns_user_with_roles() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (body, status) = app.get_auth("/api/v1/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], common::ADMIN_EMAIL);
    assert_eq!(body["data"]["roles"], json!(["admin"]));
    assert!(body["data"].get("password_hash").is_none());

    common::cleanup(app).await;
}

#[tokio::test]
async fn refresh_token_rotation_and_reuse() {
    let app = common::spawn_app().await;
    app.bootstrap().await;
    let (login, _) = app.login(common::ADMIN_EMAIL, common::PASSWORD).await;
    let refresh = login["data"]["refresh_token"].as_str().unwrap().to_string();

    let refresh_with = |token: String| {
        app.client
            .post(app.url("/api/v1/auth/refresh"))
            .json(&json!({ "refresh_token": token }))
            .send()
    };

    let resp = refresh_with(refresh.clone()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let rotated = body["data"]["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, refresh);

    // Replaying the spent token revokes the whole family
    let resp = refresh_with(refresh).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = refresh_with(rotated).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/api/v1/employees")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (_, status) = app.get_auth("/api/v1/employees", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

// ── Organization ────────────────────────────────────────────────

#[tokio::test]
async fn companies_crud_and_duplicate_code() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let company = app.create_company(&token, "HLD").await;
    assert_eq!(company["company_type"], "holding");

    let (body, status) = app
        .post_auth(
            "/api/v1/companies",
            &token,
            &json!({ "name": "Other", "code": "HLD", "company_type": "holding" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (_, status) = app
        .post_auth(
            "/api/v1/companies",
            &token,
            &json!({ "name": "Bad", "code": "BAD", "company_type": "cooperative" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/companies/{}", id_of(&company)),
            &token,
            &json!({ "name": "PT Renamed", "code": "HLD", "company_type": "holding" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "PT Renamed");

    common::cleanup(app).await;
}

#[tokio::test]
async fn list_endpoints_are_paginated() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    for code in ["A01", "A02", "A03"] {
        app.create_company(&token, code).await;
    }

    let (body, status) = app
        .get_auth("/api/v1/companies?page=2&per_page=2", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["per_page"], 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);

    common::cleanup(app).await;
}

#[tokio::test]
async fn employee_role_cannot_manage_organization() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let company = app.create_company(&admin, "HLD").await;
    let employee = app.create_employee(&admin, &id_of(&company), "E001").await;
    let token = app
        .employee_login(&admin, &id_of(&employee), "e001@login.com", &["employee"])
        .await;

    let (_, status) = app
        .post_auth(
            "/api/v1/companies",
            &token,
            &json!({ "name": "X", "code": "X", "company_type": "holding" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, status) = app.get_auth("/api/v1/audit-events", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

#[tokio::test]
async fn work_location_coordinates_and_radius_are_bounded() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;

    let location = |lat: f64, lon: f64, radius: Option<i32>| {
        json!({
            "company_id": id_of(&company),
            "name": "Head office",
            "latitude": lat,
            "longitude": lon,
            "radius_meters": radius,
        })
    };

    let (_, status) = app
        .post_auth("/api/v1/work-locations", &token, &location(91.0, 106.8, None))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (_, status) = app
        .post_auth("/api/v1/work-locations", &token, &location(-6.2, 181.0, None))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (_, status) = app
        .post_auth("/api/v1/work-locations", &token, &location(-6.2, 106.8, Some(5)))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (_, status) = app
        .post_auth("/api/v1/work-locations", &token, &location(-6.2, 106.8, Some(5_001)))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (body, status) = app
        .post_auth("/api/v1/work-locations", &token, &location(-6.2, 106.8, None))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["radius_meters"], 100);

    common::cleanup(app).await;
}

// ── Employees ───────────────────────────────────────────────────

#[tokio::test]
async fn employee_soft_delete_keeps_record() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;
    assert_eq!(employee["employment_status"], "active");
    let path = format!("/api/v1/employees/{}", id_of(&employee));

    let (body, status) = app.delete_auth(&path, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["employment_status"], "inactive");
    assert!(body["data"]["termination_date"].is_string());

    let (body, status) = app.get_auth(&path, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["employment_status"], "inactive");

    common::cleanup(app).await;
}

#[tokio::test]
async fn employee_requires_core_fields() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;

    let (body, status) = app
        .post_auth(
            "/api/v1/employees",
            &token,
            &json!({ "employee_number": "E9", "company_id": id_of(&company), "full_name": "X" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("email"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn sensitive_identifiers_are_encrypted_at_rest() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/employees/{}", id_of(&employee)),
            &token,
            &json!({ "tax_id": "123456789012345" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tax_id"], "123456789012345");

    let stored: Option<Vec<u8>> =
        sqlx::query_scalar("SELECT tax_id_encrypted FROM employees WHERE employee_number = 'E001'")
            .fetch_one(&app.pool)
            .await
            .unwrap();
    let stored = stored.unwrap();
    assert!(!String::from_utf8_lossy(&stored).contains("123456789012345"));

    common::cleanup(app).await;
}

// ── Movements ───────────────────────────────────────────────────

async fn create_promotion(app: &common::TestApp, token: &str, employee_id: &str) -> Value {
    let (body, status) = app
        .post_auth(
            "/api/v1/movements",
            token,
            &json!({
                "employee_id": employee_id,
                "movement_type": "promotion",
                "effective_date": "2025-07-01",
                "new_salary": 15_000_000,
                "reason": "Annual review",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "create movement failed: {body}");
    body["data"].clone()
}

#[tokio::test]
async fn promotion_is_applied_only_after_apply() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;
    let employee_path = format!("/api/v1/employees/{}", id_of(&employee));

    let movement = create_promotion(&app, &token, &id_of(&employee)).await;
    assert_eq!(movement["status"], "pending");
    assert_eq!(movement["old_salary"], 10_000_000);
    let path = format!("/api/v1/movements/{}", id_of(&movement));

    let (body, status) = app
        .post_auth(&format!("{path}/approve"), &token, &json!({ "notes": "ok" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["is_applied"], false);

    let (body, _) = app.get_auth(&employee_path, &token).await;
    assert_eq!(body["data"]["base_salary"], 10_000_000);

    let (body, status) = app.post_auth(&format!("{path}/apply"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "applied");
    assert_eq!(body["data"]["is_applied"], true);

    let (body, _) = app.get_auth(&employee_path, &token).await;
    assert_eq!(body["data"]["base_salary"], 15_000_000);

    // Applied is terminal
    let (_, status) = app.post_auth(&format!("{path}/apply"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, status) = app.post_auth(&format!("{path}/cancel"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (body, status) = app
        .get_auth(&format!("{employee_path}/movements"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn reject_requires_reason_and_locks_movement() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;
    let movement = create_promotion(&app, &token, &id_of(&employee)).await;
    let path = format!("/api/v1/movements/{}", id_of(&movement));

    let (_, status) = app.post_auth(&format!("{path}/reject"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (_, status) = app
        .post_auth(&format!("{path}/reject"), &token, &json!({ "reason": "   " }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (body, status) = app
        .post_auth(&format!("{path}/reject"), &token, &json!({ "reason": "Budget" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "rejected");
    assert_eq!(body["data"]["rejection_reason"], "Budget");

    let (_, status) = app.delete_auth(&path, &token).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, status) = app.post_auth(&format!("{path}/approve"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let missing = format!("/api/v1/movements/{}", uuid::Uuid::now_v7());
    let (_, status) = app.delete_auth(&missing, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn draft_movement_submit_and_delete() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;

    let (body, status) = app
        .post_auth(
            "/api/v1/movements",
            &token,
            &json!({
                "employee_id": id_of(&employee),
                "movement_type": "salary_adjustment",
                "effective_date": "2025-07-01",
                "new_salary": 11_000_000,
                "draft": true,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "draft");
    let path = format!("/api/v1/movements/{}", id_of(&body["data"]));

    let (_, status) = app.post_auth(&format!("{path}/approve"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (body, status) = app.post_auth(&format!("{path}/submit"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");

    let (body, status) = app.delete_auth(&path, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], true);

    common::cleanup(app).await;
}

#[tokio::test]
async fn movement_without_changes_is_rejected() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;

    let (_, status) = app
        .post_auth(
            "/api/v1/movements",
            &token,
            &json!({
                "employee_id": id_of(&employee),
                "movement_type": "promotion",
                "effective_date": "2025-07-01",
                "new_salary": 10_000_000,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    common::cleanup(app).await;
}

#[tokio::test]
async fn pending_movement_cannot_be_applied() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;
    let movement = create_promotion(&app, &token, &id_of(&employee)).await;
    let path = format!("/api/v1/movements/{}", id_of(&movement));

    let (_, status) = app.post_auth(&format!("{path}/apply"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (body, _) = app.get_auth(&path, &token).await;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["is_applied"], false);
    let (body, _) = app
        .get_auth(&format!("/api/v1/employees/{}", id_of(&employee)), &token)
        .await;
    assert_eq!(body["data"]["base_salary"], 10_000_000);

    common::cleanup(app).await;
}

#[tokio::test]
async fn approved_movement_can_be_cancelled_before_apply() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;
    let movement = create_promotion(&app, &token, &id_of(&employee)).await;
    let path = format!("/api/v1/movements/{}", id_of(&movement));

    let (_, status) = app.post_auth(&format!("{path}/approve"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app
        .post_auth(&format!("{path}/cancel"), &token, &json!({ "reason": "Budget freeze" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(body["data"]["is_applied"], false);

    let (_, status) = app.post_auth(&format!("{path}/apply"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (body, _) = app
        .get_auth(&format!("/api/v1/employees/{}", id_of(&employee)), &token)
        .await;
    assert_eq!(body["data"]["base_salary"], 10_000_000);

    common::cleanup(app).await;
}

// ── Profile ─────────────────────────────────────────────────────

#[tokio::test]
async fn profile_update_only_touches_contact_fields() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;
    let own = app
        .employee_login(&token, &id_of(&employee), "budi@test.com", &["employee"])
        .await;

    let (body, status) = app
        .put_auth(
            "/api/v1/profile",
            &own,
            &json!({
                "phone": "0812-555-0101",
                "emergency_contact_name": "Sari",
                "base_salary": 99_000_000,
                "full_name": "Someone Else",
                "employment_status": "terminated",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["phone"], "0812-555-0101");
    assert_eq!(body["data"]["emergency_contact_name"], "Sari");

    let (body, _) = app
        .get_auth(&format!("/api/v1/employees/{}", id_of(&employee)), &token)
        .await;
    assert_eq!(body["data"]["base_salary"], 10_000_000);
    assert_eq!(body["data"]["full_name"], "Employee E001");
    assert_eq!(body["data"]["employment_status"], "active");
    assert_eq!(body["data"]["phone"], "0812-555-0101");

    common::cleanup(app).await;
}

// ── Performance reviews ─────────────────────────────────────────

#[tokio::test]
async fn performance_review_lifecycle() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;
    let own = app
        .employee_login(&token, &id_of(&employee), "budi@test.com", &["employee"])
        .await;

    let (body, status) = app
        .post_auth(
            "/api/v1/performance-reviews",
            &token,
            &json!({ "employee_id": id_of(&employee), "period": "2025-H1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "draft");
    let path = format!("/api/v1/performance-reviews/{}", id_of(&body["data"]));

    // A draft needs a rating before it can be submitted
    let (_, status) = app.post_auth(&format!("{path}/submit"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (body, status) = app
        .put_auth(
            &path,
            &token,
            &json!({ "period": "2025-H1", "overall_rating": 4, "strengths": "Ownership" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["overall_rating"], 4);

    let (_, status) = app.post_auth(&format!("{path}/acknowledge"), &own, &json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (body, status) = app.post_auth(&format!("{path}/submit"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "submitted");

    let (_, status) = app
        .put_auth(&path, &token, &json!({ "period": "2025-H1", "overall_rating": 2 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, status) = app.delete_auth(&path, &token).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, status) = app.post_auth(&format!("{path}/acknowledge"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (body, status) = app.post_auth(&format!("{path}/acknowledge"), &own, &json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "acknowledged");
    assert_eq!(body["data"]["overall_rating"], 4);

    common::cleanup(app).await;
}

// ── Dashboard ───────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_summary_counts_working_headcount() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let first = app.create_employee(&token, &id_of(&company), "E001").await;
    let second = app.create_employee(&token, &id_of(&company), "E002").await;
    app.create_employee(&token, &id_of(&company), "E003").await;
    create_promotion(&app, &token, &id_of(&first)).await;

    let (_, status) = app
        .delete_auth(&format!("/api/v1/employees/{}", id_of(&second)), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (body, status) = app.get_auth("/api/v1/dashboard/summary", &token).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let summary = &body["data"];
    assert_eq!(summary["headcount"], 2);
    assert_eq!(summary["pending_movements"], 1);
    assert_eq!(summary["pending_leave_requests"], 0);
    assert_eq!(summary["attendance_today"]["present"], 0);
    assert_eq!(summary["by_company"][0]["company_id"], company["id"]);
    assert_eq!(summary["by_company"][0]["count"], 2);

    let own = app
        .employee_login(&token, &id_of(&first), "budi@test.com", &["employee"])
        .await;
    let (_, status) = app.get_auth("/api/v1/dashboard/summary", &own).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    common::cleanup(app).await;
}

// ── Notifications ───────────────────────────────────────────────

#[tokio::test]
async fn approval_notifies_requester() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;
    let movement = create_promotion(&app, &token, &id_of(&employee)).await;

    let (_, status) = app
        .post_auth(
            &format!("/api/v1/movements/{}/approve", id_of(&movement)),
            &token,
            &json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (body, _) = app.get_auth("/api/v1/notifications/unread-count", &token).await;
    assert_eq!(body["data"]["count"], 1);

    let (body, status) = app
        .get_auth("/api/v1/notifications?unread_only=true", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let notification = body["data"][0].clone();
    assert_eq!(notification["is_read"], false);
    assert_eq!(notification["notification_type"], "movement");

    let (body, status) = app
        .put_auth(
            &format!("/api/v1/notifications/{}/read", id_of(&notification)),
            &token,
            &json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_read"], true);

    let (body, _) = app.get_auth("/api/v1/notifications/unread-count", &token).await;
    assert_eq!(body["data"]["count"], 0);

    let (body, status) = app.put_auth("/api/v1/notifications/read-all", &token, &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated"], 0);

    common::cleanup(app).await;
}

// ── Leave ───────────────────────────────────────────────────────

#[tokio::test]
async fn leave_request_approval_updates_balance() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let company = app.create_company(&admin, "HLD").await;
    let employee = app.create_employee(&admin, &id_of(&company), "E001").await;
    let token = app
        .employee_login(&admin, &id_of(&employee), "e001@login.com", &["employee"])
        .await;

    // 2030-01-07 is a Monday; the range spans one weekend.
    let (body, status) = app
        .post_auth(
            "/api/v1/leave-requests",
            &token,
            &json!({
                "leave_type": "annual",
                "start_date": "2030-01-07",
                "end_date": "2030-01-14",
                "reason": "Family trip",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["days"], 6);
    assert_eq!(body["data"]["status"], "pending");
    let leave_path = format!("/api/v1/leave-requests/{}", id_of(&body["data"]));

    let (body, _) = app.get_auth("/api/v1/leave-balance?year=2030", &token).await;
    assert_eq!(body["data"]["pending"], 6);
    assert_eq!(body["data"]["used"], 0);

    let (_, status) = app
        .post_auth(
            "/api/v1/leave-requests",
            &token,
            &json!({ "leave_type": "sick", "start_date": "2030-01-10", "end_date": "2030-01-10" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, status) = app.post_auth(&format!("{leave_path}/approve"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (body, status) = app.post_auth(&format!("{leave_path}/approve"), &admin, &json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "approved");

    let (body, _) = app.get_auth("/api/v1/leave-balance?year=2030", &token).await;
    assert_eq!(body["data"]["used"], 6);
    assert_eq!(body["data"]["pending"], 0);
    assert_eq!(body["data"]["remaining"], 6);

    let (_, status) = app.post_auth(&format!("{leave_path}/cancel"), &token, &json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (body, _) = app.get_auth("/api/v1/notifications/unread-count", &token).await;
    assert_eq!(body["data"]["count"], 1);

    common::cleanup(app).await;
}

#[tokio::test]
async fn annual_leave_cannot_exceed_balance() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let company = app.create_company(&admin, "HLD").await;
    let employee = app.create_employee(&admin, &id_of(&company), "E001").await;
    let token = app
        .employee_login(&admin, &id_of(&employee), "e001@login.com", &["employee"])
        .await;

    let (body, status) = app
        .post_auth(
            "/api/v1/leave-requests",
            &token,
            &json!({
                "leave_type": "annual",
                "start_date": "2030-02-04",
                "end_date": "2030-02-22",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

    let (_, status) = app
        .post_auth(
            "/api/v1/leave-requests",
            &token,
            &json!({
                "leave_type": "annual",
                "start_date": "2030-03-09",
                "end_date": "2030-03-10",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "weekend-only request has no days");

    common::cleanup(app).await;
}

// ── Attendance ──────────────────────────────────────────────────

#[tokio::test]
async fn clock_in_and_out_once_per_day() {
    let app = common::spawn_app().await;
    let admin = app.bootstrap().await;
    let company = app.create_company(&admin, "HLD").await;
    let employee = app.create_employee(&admin, &id_of(&company), "E001").await;
    let token = app
        .employee_login(&admin, &id_of(&employee), "e001@login.com", &["employee"])
        .await;
    let position = json!({ "latitude": -6.2, "longitude": 106.8 });

    let (body, status) = app.post_auth("/api/v1/attendance/clock-in", &token, &position).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(["present", "late"].contains(&body["data"]["status"].as_str().unwrap()));

    let (_, status) = app.post_auth("/api/v1/attendance/clock-in", &token, &position).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (body, status) = app.post_auth("/api/v1/attendance/clock-out", &token, &position).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["clock_out_at"].is_string());

    let (_, status) = app.post_auth("/api/v1/attendance/clock-out", &token, &position).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (body, status) = app.get_auth("/api/v1/attendance/today", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["clock_in_at"].is_string());

    // The bootstrap admin has no employee record
    let (_, status) = app.post_auth("/api/v1/attendance/clock-in", &admin, &position).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, status) = app
        .post_auth(
            "/api/v1/attendance/clock-in",
            &token,
            &json!({ "latitude": 95.0, "longitude": 0.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    common::cleanup(app).await;
}

// ── Uploads ─────────────────────────────────────────────────────

#[tokio::test]
async fn document_upload_is_attached_to_employee() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;

    let form = reqwest::multipart::Form::new()
        .text("employee_id", id_of(&employee))
        .text("document_type", "contract")
        .part(
            "file",
            reqwest::multipart::Part::bytes(b"%PDF-1.4 test".to_vec()).file_name("contract.pdf"),
        );
    let resp = app
        .client
        .post(app.url("/api/v1/upload/documents"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["mime_type"], "application/pdf");
    assert_eq!(body["data"]["document"]["document_type"], "contract");

    let (body, status) = app
        .get_auth(&format!("/api/v1/employees/{}/documents", id_of(&employee)), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(b"MZ".to_vec()).file_name("tool.exe"),
    );
    let resp = app
        .client
        .post(app.url("/api/v1/upload/documents"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    common::cleanup(app).await;
}

async fn upload_file(
    app: &common::TestApp,
    token: &str,
    path: &str,
    form: reqwest::multipart::Form,
) -> (Value, StatusCode) {
    let resp = app
        .client
        .post(app.url(path))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    let status = resp.status();
    (resp.json().await.unwrap_or(Value::Null), status)
}

fn count_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() {
                        count_files(&path)
                    } else {
                        1
                    }
                })
                .sum()
        })
        .unwrap_or(0)
}

fn pdf(name: &str, bytes: &[u8]) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(name.to_string())
}

#[tokio::test]
async fn template_versions_and_download() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let form = reqwest::multipart::Form::new()
        .text("name", "Employment contract")
        .text("category", "contract")
        .part("file", pdf("contract-v1.pdf", b"%PDF-1.4 v1"));
    let (body, status) = upload_file(&app, &token, "/api/v1/templates/upload", form).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["version"], 1);
    assert_eq!(body["data"]["file_type"], "application/pdf");
    let path = format!("/api/v1/templates/{}", id_of(&body["data"]));

    let form =
        reqwest::multipart::Form::new().part("file", pdf("contract-v2.pdf", b"%PDF-1.4 v2"));
    let (body, status) = upload_file(&app, &token, &format!("{path}/upload"), form).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["version"], 2);
    assert_eq!(body["data"]["file_name"], "contract-v2.pdf");

    let (body, status) = app.get_auth(&format!("{path}/versions"), &token).await;
    assert_eq!(status, StatusCode::OK);
    let versions = body["data"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["version"], 2);
    assert_eq!(versions[1]["file_name"], "contract-v1.pdf");

    let resp = app
        .client
        .get(app.url(&format!("{path}/download")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[reqwest::header::CONTENT_TYPE], "application/pdf");
    let disposition = resp.headers()[reqwest::header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(disposition, "attachment; filename=\"contract-v2.pdf\"");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"%PDF-1.4 v2");

    // A version for a missing template leaves nothing behind in storage
    let form = reqwest::multipart::Form::new().part("file", pdf("stray.pdf", b"%PDF-1.4 x"));
    let missing = format!("/api/v1/templates/{}/upload", uuid::Uuid::now_v7());
    let (_, status) = upload_file(&app, &token, &missing, form).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(count_files(&app.upload_dir.join("templates")), 2);

    common::cleanup(app).await;
}

#[tokio::test]
async fn templates_cannot_take_over_employee_documents() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    let company = app.create_company(&token, "HLD").await;
    let employee = app.create_employee(&token, &id_of(&company), "E001").await;

    let form = reqwest::multipart::Form::new()
        .text("employee_id", id_of(&employee))
        .text("document_type", "contract")
        .part("file", pdf("contract.pdf", b"%PDF-1.4 private"));
    let (body, status) = upload_file(&app, &token, "/api/v1/upload/documents", form).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let private_path = body["data"]["file_path"].as_str().unwrap().to_string();

    let template = |file_path: &str| {
        json!({ "name": "Contract", "category": "contract", "file_path": file_path })
    };
    let (_, status) = app
        .post_auth("/api/v1/templates", &token, &template(&private_path))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let form =
        reqwest::multipart::Form::new().part("file", pdf("policy.pdf", b"%PDF-1.4 shared"));
    let (body, status) = upload_file(&app, &token, "/api/v1/upload/documents", form).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let shared_path = body["data"]["file_path"].as_str().unwrap().to_string();

    let (body, status) = app
        .post_auth("/api/v1/templates", &token, &template(&shared_path))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let template_file = body["data"]["file_path"].as_str().unwrap().to_string();
    assert!(template_file.starts_with("templates/"), "{template_file}");
    assert_ne!(template_file, shared_path);

    let (_, status) = app
        .delete_auth(&format!("/api/v1/templates/{}", id_of(&body["data"])), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    assert!(app.upload_dir.join(&shared_path).exists());
    assert!(app.upload_dir.join(&private_path).exists());
    assert!(!app.upload_dir.join(&template_file).exists());
    let (body, _) = app
        .get_auth(&format!("/api/v1/employees/{}/documents", id_of(&employee)), &token)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    common::cleanup(app).await;
}

// ── Payroll settings ────────────────────────────────────────────

#[tokio::test]
async fn overlapping_tax_brackets_conflict() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let bracket = |min: i64, max: Option<i64>, rate: i32| {
        json!({ "effective_year": 2025, "min_income": min, "max_income": max, "rate_bps": rate })
    };

    let (body, status) = app
        .post_auth(
            "/api/v1/payroll/tax-brackets",
            &token,
            &bracket(0, Some(60_000_000), 500),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, status) = app
        .post_auth(
            "/api/v1/payroll/tax-brackets",
            &token,
            &bracket(50_000_000, Some(250_000_000), 1500),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, status) = app
        .post_auth(
            "/api/v1/payroll/tax-brackets",
            &token,
            &bracket(60_000_000, None, 1500),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (body, _) = app
        .get_auth("/api/v1/payroll/tax-brackets?effective_year=2025", &token)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    common::cleanup(app).await;
}

#[tokio::test]
async fn tax_simulation_combines_ter_and_brackets() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;

    let (body, status) = app
        .post_auth(
            "/api/v1/payroll/ptkp",
            &token,
            &json!({
                "code": "TK/0",
                "description": "Single, no dependants",
                "annual_amount": 54_000_000,
                "ter_category": "A",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let ter = |min: i64, max: Option<i64>, rate: i32| {
        json!({ "category": "A", "min_income": min, "max_income": max, "rate_bps": rate })
    };
    let (body, status) = app
        .post_auth("/api/v1/payroll/ter-configs", &token, &ter(0, Some(5_400_000), 0))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    // TER bands include both ends, so a shared edge is a conflict
    let (_, status) = app
        .post_auth("/api/v1/payroll/ter-configs", &token, &ter(5_400_000, None, 500))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (body, status) = app
        .post_auth("/api/v1/payroll/ter-configs", &token, &ter(5_400_001, None, 500))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let bracket = |min: i64, max: Option<i64>, rate: i32| {
        json!({ "effective_year": 2025, "min_income": min, "max_income": max, "rate_bps": rate })
    };
    for band in [bracket(0, Some(60_000_000), 500), bracket(60_000_000, None, 1500)] {
        let (body, status) = app
            .post_auth("/api/v1/payroll/tax-brackets", &token, &band)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (body, status) = app
        .post_auth(
            "/api/v1/payroll/tax-simulation",
            &token,
            &json!({ "monthly_gross": 10_000_000, "ptkp_code": "TK/0" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let sim = &body["data"];
    assert_eq!(sim["ter_category"], "A");
    assert_eq!(sim["ter_rate_bps"], 500);
    assert_eq!(sim["ter_rate_label"], "5%");
    assert_eq!(sim["monthly_withholding"], 500_000);
    // 12 * 10jt - 54jt = 66jt; 60jt * 5% + 6jt * 15%
    assert_eq!(sim["annual_taxable_income"], 66_000_000);
    assert_eq!(sim["annual_tax"], 3_900_000);
    assert_eq!(sim["annual_tax_label"], "Rp 3.900.000");

    let (_, status) = app
        .post_auth(
            "/api/v1/payroll/tax-simulation",
            &token,
            &json!({ "monthly_gross": 10_000_000, "ptkp_code": "K/3" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    common::cleanup(app).await;
}

// ── Audit ───────────────────────────────────────────────────────

#[tokio::test]
async fn writes_are_audited() {
    let app = common::spawn_app().await;
    let token = app.bootstrap().await;
    app.create_company(&token, "HLD").await;

    let (body, status) = app
        .get_auth("/api/v1/audit-events?resource_type=company", &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["action"], "company.created");

    common::cleanup(app).await;
}
