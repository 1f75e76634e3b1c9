mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::TestApp;
use konvite::background::run_due_jobs;
use konvite::domain::models::{job::{Job, JOB_REMINDER_1DAY}, notification::Channel};
use serde_json::{json, Value};

async fn job_status(app: &TestApp, job_type: &str, rsvp_id: &str) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT status FROM jobs WHERE job_type = ? AND json_extract(payload, '$.rsvp_id') = ?"
    )
        .bind(job_type)
        .bind(rsvp_id)
        .fetch_all(&app.pool)
        .await
        .unwrap()
}

async fn confirm(app: &TestApp, event: &Value, guest: &common::AuthHeaders) -> Value {
    let (status, rsvp) = app.request("POST", &format!("/api/v1/public/events/{}/rsvp", event["short_id"].as_str().unwrap()), Some(guest), Some(json!({
        "status": "confirmed"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    rsvp
}

async fn queue_reminder(app: &TestApp, rsvp: &Value) {
    let job = Job::new(
        JOB_REMINDER_1DAY,
        rsvp["id"].as_str().unwrap().to_string(),
        rsvp["event_id"].as_str().unwrap().to_string(),
        Utc::now() - Duration::minutes(1),
    );
    app.state.job_repo.create(&job).await.unwrap();
}

#[tokio::test]
async fn test_worker_sends_confirmation_with_calendar_file() {
    let app = TestApp::new().await;
    let host = app.signup("host@example.com", "Hana").await;
    let guest = app.signup("guest@example.com", "Gil").await;
    let event = app.create_event(&host, "Backyard BBQ").await;
    let rsvp = confirm(&app, &event, &guest).await;
    let rsvp_id = rsvp["id"].as_str().unwrap();

    let claimed = run_due_jobs(&app.state).await;
    assert_eq!(claimed, 1);
    assert_eq!(job_status(&app, "CONFIRMATION", rsvp_id).await, vec!["COMPLETED".to_string()]);

    {
        let sent = app.gateway.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, Channel::Email);
        assert_eq!(sent[0].recipient, "guest@example.com");
        assert_eq!(sent[0].subject, "You're confirmed for Backyard BBQ");
        assert!(sent[0].body.contains(&format!("https://konvite.test/e/{}", event["short_id"].as_str().unwrap())));

        let attachment = sent[0].attachment.as_ref().unwrap();
        assert_eq!(attachment.filename, "Backyard_BBQ.ics");
        assert!(String::from_utf8_lossy(&attachment.content).contains("BEGIN:VCALENDAR"));
    }

    // reminders are a month away and stay queued
    assert_eq!(run_due_jobs(&app.state).await, 0);
    assert_eq!(job_status(&app, JOB_REMINDER_1DAY, rsvp_id).await, vec!["PENDING".to_string()]);

    let (status, history) = app.request("GET", &format!("/api/v1/events/{}/notifications", event["id"].as_str().unwrap()), Some(&host), None).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["notification_type"], "confirmation");
    assert_eq!(history[0]["status"], "sent");
    assert_eq!(history[0]["message_id"], "msg-1");
}

#[tokio::test]
async fn test_failed_and_skipped_channels_are_recorded() {
    let app = TestApp::new().await;
    let host = app.signup("audit@example.com", "Ada").await;
    let guest = app.signup("nophone@example.com", "Noa").await;
    let event = app.create_event(&host, "Street fair").await;
    let rsvp = confirm(&app, &event, &guest).await;
    run_due_jobs(&app.state).await;

    let (status, _) = app.request("PUT", &format!("/api/v1/rsvps/{}/reminders", rsvp["id"].as_str().unwrap()), Some(&guest), Some(json!({
        "whatsapp_reminders": true
    }))).await;
    assert_eq!(status, StatusCode::OK);

    app.gateway.failing.lock().push(Channel::Email);
    queue_reminder(&app, &rsvp).await;
    assert_eq!(run_due_jobs(&app.state).await, 1);

    // delivery problems are recorded per channel, the job itself succeeds
    let statuses: Vec<String> = job_status(&app, JOB_REMINDER_1DAY, rsvp["id"].as_str().unwrap()).await;
    assert!(statuses.contains(&"COMPLETED".to_string()));

    let rows: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT notification_type, channel, status FROM event_notifications WHERE notification_type = 'reminder_1day' ORDER BY channel"
    )
        .fetch_all(&app.pool)
        .await
        .unwrap();
    assert_eq!(rows, vec![
        ("reminder_1day".to_string(), "email".to_string(), "failed".to_string()),
        ("reminder_1day".to_string(), "whatsapp".to_string(), "skipped".to_string()),
    ]);
}

#[tokio::test]
async fn test_reminder_skipped_after_guest_declines() {
    let app = TestApp::new().await;
    let host = app.signup("skip@example.com", "Sky").await;
    let guest = app.signup("flaky@example.com", "Flo").await;
    let event = app.create_event(&host, "Poetry night").await;
    let rsvp = confirm(&app, &event, &guest).await;
    run_due_jobs(&app.state).await;
    let sent_before = app.gateway.sent.lock().len();

    app.request("POST", &format!("/api/v1/public/events/{}/rsvp", event["short_id"].as_str().unwrap()), Some(&guest), Some(json!({
        "status": "declined"
    }))).await;
    queue_reminder(&app, &rsvp).await;

    assert_eq!(run_due_jobs(&app.state).await, 1);
    assert_eq!(app.gateway.sent.lock().len(), sent_before);
}

#[tokio::test]
async fn test_jobs_for_deleted_guests_and_unknown_types() {
    let app = TestApp::new().await;
    let host = app.signup("gone@example.com", "Gus").await;
    let event = app.create_event(&host, "Movie night").await;
    let event_id = event["id"].as_str().unwrap();

    let (_, guest) = app.request("POST", &format!("/api/v1/events/{}/guests", event_id), Some(&host), Some(json!({
        "name": "Temp", "email": "temp@example.com"
    }))).await;
    let rsvp_id = guest["id"].as_str().unwrap().to_string();
    app.request("DELETE", &format!("/api/v1/rsvps/{}", rsvp_id), Some(&host), None).await;

    let orphan = Job::new(JOB_REMINDER_1DAY, rsvp_id.clone(), event_id.to_string(), Utc::now() - Duration::minutes(1));
    let unknown = Job::new("NEWSLETTER", rsvp_id.clone(), event_id.to_string(), Utc::now() - Duration::minutes(1));
    app.state.job_repo.create(&orphan).await.unwrap();
    app.state.job_repo.create(&unknown).await.unwrap();

    assert_eq!(run_due_jobs(&app.state).await, 2);

    let (status, error): (String, Option<String>) = sqlx::query_as("SELECT status, error_message FROM jobs WHERE id = ?")
        .bind(&unknown.id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(status, "FAILED");
    assert!(error.unwrap().contains("Unknown job type NEWSLETTER"));

    let status: String = sqlx::query_scalar("SELECT status FROM jobs WHERE id = ?")
        .bind(&orphan.id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(status, "COMPLETED");
    assert!(app.gateway.sent.lock().is_empty());
}
