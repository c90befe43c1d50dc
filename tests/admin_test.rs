//! Door check-in and admin dashboard actions against a real database

mod helpers;

use axum::http::{header, Method, StatusCode};
use chrono::Local;
use serial_test::serial;
use tower::ServiceExt;
use campus_events::models::{FieldType, Role};
use campus_events::state::EventDraft;
use helpers::*;

macro_rules! require_db {
    () => {
        match TestDatabase::connect().await {
            Some(db) => db,
            None => return,
        }
    };
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
#[serial]
async fn test_repeated_check_in_creates_one_attendance_row() {
    let db = require_db!();
    let organizer = db.create_profile(Role::Organizer).await;
    let student = db.create_profile(Role::Student).await;
    let event = db.create_event(&organizer, 20).await;
    let registration_id = db
        .insert_registration(&event, &student, "CONFIRMED", "MANUAL-1699999999999-AB12CD34E")
        .await;

    let app = test_app(db.pool.clone());
    let body = r#"{"entry_code":"MANUAL-1699999999999-AB12CD34E"}"#;

    let first = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/check-in", Some(organizer.id), body))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["already_checked_in"], false);
    assert_eq!(first["registration_id"], registration_id.to_string());

    let second = app
        .oneshot(json_request(Method::POST, "/api/check-in", Some(organizer.id), body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;
    assert_eq!(second["already_checked_in"], true);
    assert_eq!(second["checked_in_at"], first["checked_in_at"]);

    assert_eq!(db.count("attendance").await, 1);
    assert_eq!(db.log_actions().await, vec!["ATTENDANCE_CHECKIN".to_string()]);
}

#[tokio::test]
#[serial]
async fn test_students_cannot_check_in_attendees() {
    let db = require_db!();
    let organizer = db.create_profile(Role::Organizer).await;
    let student = db.create_profile(Role::Student).await;
    let event = db.create_event(&organizer, 20).await;
    db.insert_registration(&event, &student, "CONFIRMED", "C0FFEE000001").await;

    let app = test_app(db.pool.clone());
    let response = app
        .oneshot(json_request(Method::POST, "/api/check-in", Some(student.id), r#"{"entry_code":"C0FFEE000001"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(db.count("attendance").await, 0);
}

#[tokio::test]
#[serial]
async fn test_pending_registration_cannot_check_in() {
    let db = require_db!();
    let admin = db.create_profile(Role::Admin).await;
    let student = db.create_profile(Role::Student).await;
    let event = db.create_event(&admin, 20).await;
    db.insert_registration(&event, &student, "PENDING", "BEEF00000001").await;

    let app = test_app(db.pool.clone());
    let response = app
        .oneshot(json_request(Method::POST, "/api/check-in", Some(admin.id), r#"{"entry_code":"BEEF00000001"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Registration is not confirmed");
}

#[tokio::test]
#[serial]
async fn test_attendance_desk_check_in_and_undo() {
    let db = require_db!();
    let admin = db.create_profile(Role::Admin).await;
    let student = db.create_profile(Role::Student).await;
    let event = db.create_event(&admin, 20).await;
    let registration_id = db.insert_registration(&event, &student, "CONFIRMED", "DESK00000001").await;

    let app = test_app(db.pool.clone());

    let response = app
        .clone()
        .oneshot(form_request(
            "/api/admin/attendance",
            admin.id,
            "action=checkin_by_code&entryCode=DESK00000001",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-dashboard/attendance?status=checked_in");

    let response = app
        .clone()
        .oneshot(form_request(
            "/api/admin/attendance",
            admin.id,
            &format!("action=undo&registrationId={}", registration_id),
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/admin-dashboard/attendance?status=undone");
    assert_eq!(db.count("attendance").await, 0);

    let response = app
        .oneshot(form_request(
            "/api/admin/attendance",
            admin.id,
            &format!("action=undo&registrationId={}", registration_id),
        ))
        .await
        .unwrap();
    assert!(location(&response).starts_with("/admin-dashboard/attendance?error="));
}

#[tokio::test]
#[serial]
async fn test_disabled_field_keeps_its_responses() {
    let db = require_db!();
    let admin = db.create_profile(Role::Admin).await;
    let event = db.create_event(&admin, 50).await;
    let dietary = db.create_field(&event, "Dietary Preference", FieldType::Text, false, &[]).await;

    for i in 0..5 {
        let student = db.create_profile(Role::Student).await;
        let registration_id = db
            .insert_registration(&event, &student, "CONFIRMED", &format!("DIET0000000{}", i))
            .await;
        db.insert_response(registration_id, &dietary, "Vegetarian").await;
    }

    let app = test_app(db.pool.clone());
    let response = app
        .clone()
        .oneshot(form_request(
            "/api/admin/form-control",
            admin.id,
            &format!("action=disable_field&eventId={}&fieldId={}", event.id, dietary.id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-dashboard/form-control?status=disable_field");

    let rows = db.service().form_fields.list_for_control().await.unwrap();
    let row = rows.iter().find(|r| r.field.id == dietary.id).unwrap();
    assert_eq!(row.status_label(), "DISABLED");
    assert_eq!(row.response_count, 5);
    assert_eq!(row.field.disabled_by, Some(admin.id));

    let responses = db.service().registrations.list_responses_for_field(dietary.id).await.unwrap();
    assert_eq!(responses.len(), 5);

    // The public form no longer offers the field
    let detail = app
        .oneshot(json_request(Method::GET, &format!("/api/events/{}", event.id), None, ""))
        .await
        .unwrap();
    assert_eq!(body_json(detail).await["form_fields"].as_array().unwrap().len(), 0);
}

#[tokio::test]
#[serial]
async fn test_required_override_round_trip() {
    let db = require_db!();
    let admin = db.create_profile(Role::Admin).await;
    let event = db.create_event(&admin, 50).await;
    let phone = db.create_field(&event, "Phone", FieldType::Number, false, &[]).await;

    let service = db.service();
    let app = test_app(db.pool.clone());
    app.clone()
        .oneshot(form_request(
            "/api/admin/form-control",
            admin.id,
            &format!("action=override_field_required&eventId={}&fieldId={}", event.id, phone.id),
        ))
        .await
        .unwrap();

    let overridden = service.form_fields.find_by_id(phone.id).await.unwrap().unwrap();
    assert!(overridden.required);
    assert_eq!(overridden.original_required, Some(false));
    assert_eq!(overridden.overridden_by, Some(admin.id));

    app.oneshot(form_request(
        "/api/admin/form-control",
        admin.id,
        &format!("action=remove_field_override&eventId={}&fieldId={}", event.id, phone.id),
    ))
    .await
    .unwrap();

    let restored = service.form_fields.find_by_id(phone.id).await.unwrap().unwrap();
    assert!(!restored.required);
    assert_eq!(restored.overridden_by, None);
}

#[tokio::test]
#[serial]
async fn test_capacity_cannot_drop_below_confirmed_without_override() {
    let db = require_db!();
    let admin = db.create_profile(Role::Admin).await;
    let event = db.create_event(&admin, 10).await;
    for i in 0..3 {
        let student = db.create_profile(Role::Student).await;
        db.insert_registration(&event, &student, "CONFIRMED", &format!("CAP00000000{}", i))
            .await;
    }

    let mut draft = EventDraft::from_event(&event, &[]);
    draft.total_capacity = 2;

    let app = test_app(db.pool.clone());
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/admin/update-event",
            Some(admin.id),
            &draft.update_payload(event.id, false).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CAPACITY_BELOW_CONFIRMED");
    assert_eq!(json["confirmed_registrations"], 3);

    let unchanged = db.service().events.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(unchanged.capacity, 10);

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/admin/update-event",
            Some(admin.id),
            &draft.update_payload(event.id, true).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["event"]["capacity"], 2);
    assert!(db.log_actions().await.contains(&"UPDATE_EVENT".to_string()));
}

#[tokio::test]
#[serial]
async fn test_removed_editor_field_is_soft_disabled() {
    let db = require_db!();
    let admin = db.create_profile(Role::Admin).await;
    let event = db.create_event(&admin, 10).await;
    let keep = db.create_field(&event, "College", FieldType::Text, true, &[]).await;
    let drop = db.create_field(&event, "Github", FieldType::Text, false, &[]).await;

    let fields = db.service().form_fields.list_for_event(event.id).await.unwrap();
    let mut draft = EventDraft::from_event(&event, &fields);
    draft.form_fields.retain(|f| f.id != drop.id.to_string());

    let app = test_app(db.pool.clone());
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/admin/update-event",
            Some(admin.id),
            &draft.update_payload(event.id, false).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let service = db.service();
    assert!(!service.form_fields.find_by_id(keep.id).await.unwrap().unwrap().disabled);
    let dropped = service.form_fields.find_by_id(drop.id).await.unwrap().unwrap();
    assert!(dropped.disabled);
    assert_eq!(dropped.disabled_by, Some(admin.id));
    assert_eq!(db.count("event_form_fields").await, 2);
}

#[tokio::test]
#[serial]
async fn test_create_event_requires_admin() {
    let db = require_db!();
    let organizer = db.create_profile(Role::Organizer).await;

    let app = test_app(db.pool.clone());
    let body = serde_json::json!({
        "event": {
            "title": "Robotics Workshop",
            "event_date": Local::now().date_naive().to_string(),
            "start_time": "09:00",
            "end_time": "12:00",
            "capacity": 40,
        },
        "form_fields": [],
    });

    let response = app
        .oneshot(json_request(Method::POST, "/api/admin/create-event", Some(organizer.id), &body.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(db.count("events").await, 0);
}

#[tokio::test]
#[serial]
async fn test_manual_add_confirms_and_exports() {
    let db = require_db!();
    let admin = db.create_profile(Role::Admin).await;
    let student = db.create_profile(Role::Student).await;
    let event = db.create_event(&admin, 10).await;

    let app = test_app(db.pool.clone());
    let response = app
        .clone()
        .oneshot(form_request(
            "/api/admin/manual-fixes",
            admin.id,
            &format!(
                "action=add_user_manually&userEmail={}&eventId={}",
                urlencoding::encode(&student.email.to_uppercase()),
                event.id
            ),
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/admin-dashboard/manual-fixes?status=manual_add_success");

    let registration = db
        .service()
        .registrations
        .find_for_user_and_event(student.id, event.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(registration.status, "CONFIRMED");
    assert!(registration.entry_code.starts_with("MANUAL-"));
    assert!(db.log_actions().await.contains(&"MANUAL_ADD_USER_INTERNET_FAILED".to_string()));

    let response = app
        .oneshot(form_request("/api/admin/exports", admin.id, "exportType=manual_registrations"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );

    let csv = body_text(response).await;
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("Registration ID"));
    assert!(lines.next().unwrap().contains(&registration.entry_code));
}

#[tokio::test]
#[serial]
async fn test_admin_cannot_change_own_role() {
    let db = require_db!();
    let admin = db.create_profile(Role::Admin).await;

    let app = test_app(db.pool.clone());
    let response = app
        .oneshot(form_request(
            "/api/admin/users",
            admin.id,
            &format!("action=demote&userId={}", admin.id),
        ))
        .await
        .unwrap();

    assert_eq!(
        location(&response),
        "/admin-dashboard/users?error=Admins%20cannot%20change%20their%20own%20account"
    );
    let reloaded = db.service().profiles.find_by_id(admin.id).await.unwrap().unwrap();
    assert_eq!(reloaded.role(), Role::Admin);
}

#[tokio::test]
#[serial]
async fn test_promotion_walks_one_step() {
    let db = require_db!();
    let admin = db.create_profile(Role::Admin).await;
    let student = db.create_profile(Role::Student).await;

    let app = test_app(db.pool.clone());
    let response = app
        .oneshot(form_request(
            "/api/admin/users",
            admin.id,
            &format!("action=promote&userId={}", student.id),
        ))
        .await
        .unwrap();

    assert_eq!(location(&response), "/admin-dashboard/users?status=role_organizer");
    assert_eq!(
        db.log_actions().await,
        vec!["ROLE_PROMOTE_STUDENT_TO_ORGANIZER".to_string()]
    );
}
