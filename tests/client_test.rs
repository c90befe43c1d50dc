//! Client flows against a mock API server

use assert_matches::assert_matches;
use chrono::{Duration, NaiveTime, Utc};
use serde_json::json;
use sqlx::types::Json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use campus_events::client::{
    ApiClient, AttendanceConsole, DraftAnswer, EventEditorSession, FileAttachment, RegistrationClient,
    RegistrationOutcome,
};
use campus_events::models::{CheckInTarget, Event, FormField};
use campus_events::state::{EditorAction, FieldUpdate};
use campus_events::CampusEventsError;

fn field(event_id: Uuid, label: &str, field_type: &str, required: bool, options: &[&str]) -> FormField {
    FormField {
        id: Uuid::new_v4(),
        event_id,
        label: label.to_string(),
        field_type: field_type.to_string(),
        required,
        options: (!options.is_empty()).then(|| Json(options.iter().map(|o| o.to_string()).collect())),
        position: 0,
        disabled: false,
        disabled_by: None,
        disabled_at: None,
        original_required: None,
        overridden_by: None,
        overridden_at: None,
        created_at: Utc::now(),
    }
}

fn paid_event(price: f64) -> Event {
    Event {
        id: Uuid::new_v4(),
        title: "Robotics Workshop".to_string(),
        description: Some("Build a line follower".to_string()),
        location: Some("Lab 3".to_string()),
        event_date: (Utc::now() + Duration::days(14)).date_naive(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        capacity: 40,
        is_registration_open: true,
        auto_close_when_full: true,
        is_paid: true,
        price,
        currency: "INR".to_string(),
        status: "approved".to_string(),
        visibility: "public".to_string(),
        assigned_organizer: None,
        created_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn api(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri()).unwrap().with_token("student-token")
}

#[tokio::test]
async fn test_blank_required_field_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let event_id = Uuid::new_v4();
    let roll = field(event_id, "Roll Number", "text", true, &[]);
    let client = RegistrationClient::new(api(&server), false);

    let result = client
        .submit(event_id, &[roll.clone()], vec![DraftAnswer::text(roll.id, "  ")])
        .await;

    assert_matches!(result, Err(CampusEventsError::Validation(message)) if message.contains("Roll Number"));
}

#[tokio::test]
async fn test_select_outside_options_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let event_id = Uuid::new_v4();
    let size = field(event_id, "T-Shirt Size", "select", true, &["S", "M", "L"]);
    let client = RegistrationClient::new(api(&server), false);

    let result = client.submit(event_id, &[size.clone()], vec![DraftAnswer::text(size.id, "XL")]).await;

    assert_matches!(result, Err(CampusEventsError::Validation(message)) if message.contains("T-Shirt Size"));
}

#[tokio::test]
async fn test_file_is_uploaded_before_registration() {
    let server = MockServer::start().await;
    let event_id = Uuid::new_v4();
    let resume = field(event_id, "Resume", "file", true, &[]);
    let registration_id = Uuid::new_v4();
    let file_url = format!("https://files.example.edu/registration-files/{}/resume.pdf", event_id);

    Mock::given(method("POST"))
        .and(path("/api/uploads"))
        .and(header("authorization", "Bearer student-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": format!("{}/resume.pdf", event_id),
            "url": file_url,
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/register-event-test"))
        .and(body_partial_json(json!({
            "event_id": event_id,
            "answers": [{"field_id": resume.id, "value": file_url}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "free": true,
            "registration_id": registration_id,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistrationClient::new(api(&server), false);
    let answer = DraftAnswer::File {
        field_id: resume.id,
        file: FileAttachment {
            file_name: "resume.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            data: b"%PDF-1.4".to_vec(),
        },
    };

    let outcome = client.submit(event_id, &[resume], vec![answer]).await.unwrap();

    assert_eq!(
        outcome,
        RegistrationOutcome::Confirmed {
            registration_id,
            ticket_path: format!("/tickets/{}", registration_id),
        }
    );
}

#[tokio::test]
async fn test_paid_registration_returns_checkout_details() {
    let server = MockServer::start().await;
    let event_id = Uuid::new_v4();
    let registration_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/register-event"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "free": false,
            "registration_id": registration_id,
            "order_id": "order_N5xY2kq9",
            "amount": 499.0,
            "razorpay_key": "rzp_test_key",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistrationClient::new(api(&server), true);
    let outcome = client.submit(event_id, &[], vec![]).await.unwrap();

    assert_matches!(
        outcome,
        RegistrationOutcome::PaymentRequired { order_id, amount, .. } if order_id == "order_N5xY2kq9" && amount == 499.0
    );
}

#[tokio::test]
async fn test_full_event_maps_to_capacity_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register-event-test"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": "Event is full",
            "code": "CAPACITY_EXCEEDED",
        })))
        .mount(&server)
        .await;

    let client = RegistrationClient::new(api(&server), false);
    let result = client.submit(Uuid::new_v4(), &[], vec![]).await;

    assert_matches!(result, Err(CampusEventsError::CapacityExceeded(message)) if message == "Event is full");
}

#[tokio::test]
async fn test_console_refetches_after_check_in() {
    let server = MockServer::start().await;
    let event_id = Uuid::new_v4();
    let registration_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/api/admin/attendance"))
        .and(query_param("event_id", event_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [],
            "checked_in": [],
            "not_checked_in": [],
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/check-in"))
        .and(body_partial_json(json!({"entry_code": "MANUAL-1699999999999-AB12CD34E"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "registration_id": registration_id,
            "already_checked_in": false,
            "checked_in_at": "2024-03-15T10:05:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut console = AttendanceConsole::new(api(&server), Some(event_id));
    console.view().await.unwrap();
    // Served from the cache
    console.view().await.unwrap();

    let reply = console
        .check_in(CheckInTarget::EntryCode("MANUAL-1699999999999-AB12CD34E".to_string()))
        .await
        .unwrap();

    assert_eq!(reply.registration_id, registration_id);
    assert!(!reply.already_checked_in);
}

#[tokio::test]
async fn test_console_surfaces_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/check-in"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "42")
                .set_body_json(json!({"success": false, "error": "Too many requests", "code": "RATE_LIMITED"})),
        )
        .mount(&server)
        .await;

    let mut console = AttendanceConsole::new(api(&server), None);
    let result = console.check_in(CheckInTarget::RegistrationId(Uuid::new_v4())).await;

    assert_matches!(result, Err(CampusEventsError::RateLimitExceeded { retry_after_seconds: 42 }));
}

#[tokio::test]
async fn test_editor_blocks_unchanged_save() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let event = paid_event(100.0);
    let mut session = EventEditorSession::new(api(&server), &event, &[]);

    let result = session.save(Utc::now().date_naive()).await;

    assert_matches!(result, Err(CampusEventsError::Validation(message)) if message == "No changes to save");
}

#[tokio::test]
async fn test_editor_saves_price_change() {
    let server = MockServer::start().await;
    let event = paid_event(100.0);
    let mut saved = event.clone();
    saved.price = 150.0;

    Mock::given(method("POST"))
        .and(path("/api/admin/update-event"))
        .and(body_partial_json(json!({
            "event_id": event.id,
            "allow_capacity_override": false,
            "event": {"price": 150.0, "event_type": "paid"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "event": saved})))
        .expect(1)
        .mount(&server)
        .await;

    let today = Utc::now().date_naive();
    let mut session = EventEditorSession::new(api(&server), &event, &[]);
    session.dispatch(EditorAction::UpdateField(FieldUpdate::Price(150.0)));

    let differences = session.review(today).unwrap();
    assert_eq!(differences.len(), 1);

    let updated = session.save(today).await.unwrap();
    assert_eq!(updated.price, 150.0);
    assert!(!session.state().is_submitting);

    // The saved draft becomes the new baseline
    assert_matches!(session.review(today), Err(CampusEventsError::Validation(_)));
}

#[tokio::test]
async fn test_load_event_reads_public_detail() {
    let server = MockServer::start().await;
    let event = paid_event(250.0);
    let size = field(event.id, "T-Shirt Size", "select", true, &["S", "M", "L"]);

    let mut body = serde_json::to_value(&event).unwrap();
    body["used_seats"] = json!(12);
    body["remaining"] = json!(28);
    body["registration_open"] = json!(true);
    body["form_fields"] = json!([size]);

    Mock::given(method("GET"))
        .and(path(format!("/api/events/{}", event.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistrationClient::new(api(&server), true);
    let loaded = client.load_event(event.id).await.unwrap();

    assert_eq!(loaded.title, "Robotics Workshop");
    assert_eq!(loaded.remaining, 28);
    assert!(loaded.registration_open);
    assert_eq!(loaded.form_fields.len(), 1);
    assert_eq!(loaded.form_fields[0].options.as_ref().unwrap().0, vec!["S", "M", "L"]);
}

#[tokio::test]
async fn test_check_in_survives_forbidden_view_refresh() {
    let server = MockServer::start().await;
    let registration_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/check-in"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "registration_id": registration_id,
            "already_checked_in": false,
            "checked_in_at": "2024-03-15T10:05:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/admin/attendance"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"success": false, "error": "Permission denied"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut console = AttendanceConsole::new(api(&server), None);
    let reply = console
        .check_in(CheckInTarget::EntryCode("A1B2C3D4E5F6".to_string()))
        .await
        .unwrap();

    assert_eq!(reply.registration_id, registration_id);
    assert!(!reply.already_checked_in);
    assert!(console.cached().is_none());
}
