mod common;

use common::{AuthHeaders, TestApp};
use konvite::api::dtos::requests::LiveCommand;
use konvite::api::handlers::live::handle_command;
use konvite::domain::models::{auth::SessionUser, event::Event, rsvp::RsvpStatus};
use konvite::domain::services::guest_list::GuestListStore;
use serde_json::{json, Value};

struct Session {
    event: Event,
    organizer: SessionUser,
    store: GuestListStore,
}

impl Session {
    async fn open(app: &TestApp, auth: &AuthHeaders, event: &Value) -> Self {
        let event = app.state.event_repo.find_by_id(event["id"].as_str().unwrap()).await.unwrap().unwrap();
        let rows = app.state.rsvp_service.list(&event.id).await.unwrap();
        Self {
            store: GuestListStore::new(event.id.clone(), rows),
            organizer: SessionUser {
                id: auth.user_id.clone(),
                email: "organizer@example.com".into(),
                display_name: "Olga".into(),
            },
            event,
        }
    }

    async fn run(&mut self, app: &TestApp, command: LiveCommand) -> Vec<Value> {
        let replies = handle_command(&app.state, &self.event, &self.organizer, &mut self.store, command).await;
        replies.iter().map(|reply| serde_json::to_value(reply).unwrap()).collect()
    }
}

async fn add_guest(app: &TestApp, auth: &AuthHeaders, event: &Value, name: &str, email: &str) -> String {
    let uri = format!("/api/v1/events/{}/guests", event["id"].as_str().unwrap());
    let (_, body) = app.request("POST", &uri, Some(auth), Some(json!({ "name": name, "email": email }))).await;
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_set_status_confirms_through_the_service() {
    let app = TestApp::new().await;
    let auth = app.signup("organizer@example.com", "Olga").await;
    let event = app.create_event(&auth, "Open house").await;
    let ana = add_guest(&app, &auth, &event, "Ana", "ana@example.com").await;
    let mut session = Session::open(&app, &auth, &event).await;

    let replies = session.run(&app, LiveCommand::SetStatus { rsvp_id: ana.clone(), status: RsvpStatus::Confirmed }).await;

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["type"], "status_result");
    assert_eq!(replies[0]["rsvp_id"], ana.as_str());
    assert_eq!(replies[0]["ok"], true);
    assert!(replies[0].get("error").is_none());
    assert_eq!(replies[0]["guest"]["status"], "confirmed");
    assert!(!session.store.is_pending(&ana));

    let stored = app.state.rsvp_service.find(&ana).await.unwrap();
    assert_eq!(stored.status(), RsvpStatus::Confirmed);
    let history = app.state.rsvp_service.history(&ana).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].changed_by.as_deref(), Some(auth.user_id.as_str()));
}

#[tokio::test]
async fn test_set_status_rejects_unknown_and_foreign_guests() {
    let app = TestApp::new().await;
    let auth = app.signup("organizer@example.com", "Olga").await;
    let event = app.create_event(&auth, "Open house").await;
    let other = app.create_event(&auth, "Another party").await;
    add_guest(&app, &auth, &event, "Ana", "ana@example.com").await;
    let zed = add_guest(&app, &auth, &other, "Zed", "zed@example.com").await;
    let mut session = Session::open(&app, &auth, &event).await;

    let replies = session.run(&app, LiveCommand::SetStatus { rsvp_id: "missing".into(), status: RsvpStatus::Maybe }).await;
    assert_eq!(replies[0]["type"], "status_result");
    assert_eq!(replies[0]["ok"], false);
    assert_eq!(replies[0]["error"], "Guest missing is not on this list");
    assert_eq!(replies[0]["guest"], Value::Null);

    let replies = session.run(&app, LiveCommand::SetStatus { rsvp_id: zed.clone(), status: RsvpStatus::Declined }).await;
    assert_eq!(replies[0]["type"], "status_result");
    assert_eq!(replies[0]["rsvp_id"], zed.as_str());
    assert_eq!(replies[0]["ok"], false);
    assert_eq!(replies[0]["guest"], Value::Null);

    let untouched = app.state.rsvp_service.find(&zed).await.unwrap();
    assert_eq!(untouched.status(), RsvpStatus::Pending);
}

#[tokio::test]
async fn test_failed_status_change_rolls_back() {
    let app = TestApp::new().await;
    let auth = app.signup("organizer@example.com", "Olga").await;
    let event = app.create_event(&auth, "Open house").await;
    let ana = add_guest(&app, &auth, &event, "Ana", "ana@example.com").await;
    let mut session = Session::open(&app, &auth, &event).await;

    // the row disappears behind the session's back
    sqlx::query("DELETE FROM event_rsvps WHERE id = ?").bind(&ana).execute(&app.pool).await.unwrap();

    let replies = session.run(&app, LiveCommand::SetStatus { rsvp_id: ana.clone(), status: RsvpStatus::Confirmed }).await;
    assert_eq!(replies[0]["type"], "status_result");
    assert_eq!(replies[0]["ok"], false);
    assert_eq!(replies[0]["error"], "RSVP not found");
    assert_eq!(replies[0]["guest"]["status"], "pending");
    assert!(!session.store.is_pending(&ana));
}

#[tokio::test]
async fn test_refresh_reloads_rows_and_keeps_the_selection() {
    let app = TestApp::new().await;
    let auth = app.signup("organizer@example.com", "Olga").await;
    let event = app.create_event(&auth, "Open house").await;
    let ana = add_guest(&app, &auth, &event, "Ana", "ana@example.com").await;
    let mut session = Session::open(&app, &auth, &event).await;

    let replies = session.run(&app, LiveCommand::ToggleSelect { rsvp_id: ana.clone() }).await;
    assert_eq!(replies[0], json!({ "type": "selection", "selected": [ana.clone()] }));

    add_guest(&app, &auth, &event, "Bia", "bia@example.com").await;
    let replies = session.run(&app, LiveCommand::Refresh).await;

    assert_eq!(replies[0]["type"], "snapshot");
    assert_eq!(replies[0]["guests"].as_array().unwrap().len(), 2);
    assert_eq!(replies[0]["selected"], json!([ana]));
    assert_eq!(replies[0]["stats"]["pending"], 2);
    assert_eq!(session.store.rows().len(), 2);
}
