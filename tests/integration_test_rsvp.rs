mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::TestApp;
use serde_json::{json, Value};

async fn jobs_for(app: &TestApp, rsvp_id: &str) -> Vec<(String, String)> {
    sqlx::query_as::<_, (String, String)>(
        "SELECT job_type, status FROM jobs WHERE json_extract(payload, '$.rsvp_id') = ? ORDER BY job_type"
    )
        .bind(rsvp_id)
        .fetch_all(&app.pool)
        .await
        .unwrap()
}

fn rsvp_uri(event: &Value) -> String {
    format!("/api/v1/public/events/{}/rsvp", event["short_id"].as_str().unwrap())
}

#[tokio::test]
async fn test_responding_twice_updates_the_same_row() {
    let app = TestApp::new().await;
    let host = app.signup("host@example.com", "Host").await;
    let guest = app.signup("guest@example.com", "Gina").await;
    let event = app.create_event(&host, "Birthday bash").await;

    let (status, first) = app.request("POST", &rsvp_uri(&event), Some(&guest), Some(json!({
        "status": "maybe", "guests_count": 1
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["name"], "Gina");
    assert_eq!(first["email"], "guest@example.com");
    assert_eq!(first["user_id"], guest.user_id.as_str());

    let (status, second) = app.request("POST", &rsvp_uri(&event), Some(&guest), Some(json!({
        "status": "confirmed", "guests_count": 2, "dietary_restrictions": "vegan"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["status"], "confirmed");
    assert_eq!(second["guests_count"], 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event_rsvps WHERE event_id = ?")
        .bind(event["id"].as_str().unwrap())
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let (_, history) = app.request("GET", &format!("/api/v1/rsvps/{}/history", first["id"].as_str().unwrap()), Some(&host), None).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["previous_status"], "maybe");
    assert_eq!(history[0]["new_status"], "confirmed");
}

#[tokio::test]
async fn test_rsvp_requires_login_and_an_answer() {
    let app = TestApp::new().await;
    let host = app.signup("host2@example.com", "Host").await;
    let guest = app.signup("guest2@example.com", "Gus").await;
    let event = app.create_event(&host, "Book club").await;

    let (status, _) = app.request("POST", &rsvp_uri(&event), None, Some(json!({ "status": "confirmed" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request("POST", &rsvp_uri(&event), Some(&guest), Some(json!({ "status": "pending" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.request("POST", "/api/v1/public/events/nope1234/rsvp", Some(&guest), Some(json!({ "status": "confirmed" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deadline_and_plus_one_rules() {
    let app = TestApp::new().await;
    let host = app.signup("rules@example.com", "Rui").await;
    let guest = app.signup("late@example.com", "Lara").await;
    let event = app.create_event(&host, "Wine tasting").await;
    let settings_uri = format!("/api/v1/events/{}/settings", event["id"].as_str().unwrap());

    let (status, _) = app.request("PUT", &settings_uri, Some(&host), Some(json!({ "allow_plus_ones": false }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request("POST", &rsvp_uri(&event), Some(&guest), Some(json!({
        "status": "confirmed", "guests_count": 1
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This event does not allow plus-ones");

    let yesterday = (Utc::now() - Duration::days(2)).date_naive();
    let (status, _) = app.request("PUT", &settings_uri, Some(&host), Some(json!({ "rsvp_deadline": yesterday }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request("POST", &rsvp_uri(&event), Some(&guest), Some(json!({ "status": "confirmed" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "The RSVP deadline has passed");
}

#[tokio::test]
async fn test_private_events_are_hidden_from_guests() {
    let app = TestApp::new().await;
    let host = app.signup("private@example.com", "Pia").await;
    let guest = app.signup("outsider@example.com", "Otto").await;
    let event = app.create_event(&host, "Private gala").await;
    let public_uri = format!("/api/v1/public/events/{}", event["short_id"].as_str().unwrap());

    let (status, _) = app.request("PUT", &format!("/api/v1/events/{}", event["id"].as_str().unwrap()), Some(&host), Some(json!({
        "is_private": true
    }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request("GET", &public_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.request("POST", &rsvp_uri(&event), Some(&guest), Some(json!({ "status": "confirmed" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.request("GET", &public_uri, Some(&host), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["title"], "Private gala");
}

#[tokio::test]
async fn test_public_page_filters_guest_list() {
    let app = TestApp::new().await;
    let host = app.signup("page@example.com", "Paula").await;
    let yes = app.signup("yes@example.com", "Yara").await;
    let no = app.signup("no@example.com", "Nico").await;
    let event = app.create_event(&host, "Garden party").await;
    let public_uri = format!("/api/v1/public/events/{}", event["short_id"].as_str().unwrap());

    app.request("POST", &format!("/api/v1/events/{}/guests", event["id"].as_str().unwrap()), Some(&host), Some(json!({
        "name": "Pending Pete", "email": "pete@example.com"
    }))).await;
    app.request("POST", &rsvp_uri(&event), Some(&yes), Some(json!({ "status": "confirmed", "dietary_restrictions": "no nuts" }))).await;
    app.request("POST", &rsvp_uri(&event), Some(&no), Some(json!({ "status": "declined" }))).await;

    let (status, body) = app.request("GET", &public_uri, Some(&no), None).await;
    assert_eq!(status, StatusCode::OK);
    let guests = body["guests"].as_array().unwrap();
    assert_eq!(guests.len(), 1);
    assert_eq!(guests[0]["name"], "Yara");
    assert_eq!(guests[0]["dietary_restrictions"], "no nuts");
    assert_eq!(body["my_rsvp"]["status"], "declined");

    let (_, anonymous) = app.request("GET", &public_uri, None, None).await;
    assert_eq!(anonymous["my_rsvp"], Value::Null);

    let settings_uri = format!("/api/v1/events/{}/settings", event["id"].as_str().unwrap());
    app.request("PUT", &settings_uri, Some(&host), Some(json!({ "show_dietary_restrictions": false }))).await;
    let (_, body) = app.request("GET", &public_uri, None, None).await;
    assert!(body["guests"][0].get("dietary_restrictions").is_none());

    app.request("PUT", &settings_uri, Some(&host), Some(json!({ "show_guest_list": false }))).await;
    let (_, body) = app.request("GET", &public_uri, None, None).await;
    assert!(body.get("guests").is_none());
}

#[tokio::test]
async fn test_confirming_schedules_notifications_and_declining_cancels_them() {
    let app = TestApp::new().await;
    let host = app.signup("jobs@example.com", "Jo").await;
    let guest = app.signup("attendee@example.com", "Ari").await;
    let event = app.create_event(&host, "Conference").await;

    let (_, rsvp) = app.request("POST", &rsvp_uri(&event), Some(&guest), Some(json!({ "status": "confirmed" }))).await;
    let rsvp_id = rsvp["id"].as_str().unwrap();

    let jobs = jobs_for(&app, rsvp_id).await;
    assert_eq!(jobs, vec![
        ("CONFIRMATION".to_string(), "PENDING".to_string()),
        ("REMINDER_1DAY".to_string(), "PENDING".to_string()),
        ("REMINDER_7DAY".to_string(), "PENDING".to_string()),
    ]);

    app.request("POST", &rsvp_uri(&event), Some(&guest), Some(json!({ "status": "declined" }))).await;

    let jobs = jobs_for(&app, rsvp_id).await;
    assert_eq!(jobs.len(), 3);
    assert!(jobs.iter().all(|(_, status)| status == "CANCELLED"));
}

#[tokio::test]
async fn test_moving_the_event_moves_queued_reminders() {
    let app = TestApp::new().await;
    let host = app.signup("mover@example.com", "Mo").await;
    let guest = app.signup("early@example.com", "Eli").await;
    let event = app.create_event(&host, "Housewarming").await;
    let event_uri = format!("/api/v1/events/{}", event["id"].as_str().unwrap());

    let (_, rsvp) = app.request("POST", &rsvp_uri(&event), Some(&guest), Some(json!({ "status": "confirmed" }))).await;
    let rsvp_id = rsvp["id"].as_str().unwrap();

    let old_date = NaiveDate::parse_from_str(event["event_date"].as_str().unwrap(), "%Y-%m-%d").unwrap();
    let new_date = old_date + Duration::days(10);
    let (status, _) = app.request("PUT", &event_uri, Some(&host), Some(json!({
        "event_date": new_date.to_string(), "start_time": "20:30"
    }))).await;
    assert_eq!(status, StatusCode::OK);

    let pending: Vec<(String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT job_type, execute_at FROM jobs WHERE json_extract(payload, '$.rsvp_id') = ? AND status = 'PENDING' ORDER BY job_type"
    )
        .bind(rsvp_id)
        .fetch_all(&app.pool)
        .await
        .unwrap();

    let starts_at = new_date.and_hms_opt(20, 30, 0).unwrap().and_utc();
    let types: Vec<&str> = pending.iter().map(|(job_type, _)| job_type.as_str()).collect();
    assert_eq!(types, vec!["CONFIRMATION", "REMINDER_1DAY", "REMINDER_7DAY"]);
    assert_eq!(pending[1].1, starts_at - Duration::days(1));
    assert_eq!(pending[2].1, starts_at - Duration::days(7));

    // a title-only edit leaves the queue alone
    let before = jobs_for(&app, rsvp_id).await.len();
    app.request("PUT", &event_uri, Some(&host), Some(json!({ "title": "New home party" }))).await;
    assert_eq!(jobs_for(&app, rsvp_id).await.len(), before);
}

#[tokio::test]
async fn test_reminder_preferences_reschedule_jobs() {
    let app = TestApp::new().await;
    let host = app.signup("prefs@example.com", "Pri").await;
    let guest = app.signup("remindme@example.com", "Rita").await;
    let stranger = app.signup("nosy@example.com", "Nate").await;
    let event = app.create_event(&host, "Marathon").await;

    let (_, rsvp) = app.request("POST", &rsvp_uri(&event), Some(&guest), Some(json!({ "status": "maybe" }))).await;
    let rsvp_id = rsvp["id"].as_str().unwrap();
    let reminders_uri = format!("/api/v1/rsvps/{}/reminders", rsvp_id);

    let (status, defaults) = app.request("GET", &reminders_uri, Some(&guest), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(defaults["email_reminders"], true);
    assert_eq!(defaults["whatsapp_reminders"], false);
    assert_eq!(defaults["one_week_reminder"], true);

    let (status, _) = app.request("GET", &reminders_uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, saved) = app.request("PUT", &reminders_uri, Some(&guest), Some(json!({ "one_week_reminder": false }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["one_week_reminder"], false);
    assert_eq!(saved["one_day_reminder"], true);

    let pending: Vec<String> = jobs_for(&app, rsvp_id).await
        .into_iter()
        .filter(|(_, status)| status == "PENDING")
        .map(|(job_type, _)| job_type)
        .collect();
    assert_eq!(pending, vec!["REMINDER_1DAY".to_string()]);

    let (status, body) = app.request("GET", &reminders_uri, Some(&host), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["one_week_reminder"], false);
}
