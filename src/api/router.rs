use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{
    auth, calendar, event, guest, health, live, notification, preferences, rsvp, settings, share,
    stats, wizard,
};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/signup", post(auth::signup))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/session", get(auth::session))

        // Event creation wizard
        .route("/api/v1/wizard/drafts", post(wizard::begin_draft))
        .route("/api/v1/wizard/next", post(wizard::next))
        .route("/api/v1/wizard/back", post(wizard::back))
        .route("/api/v1/wizard/resume", post(wizard::resume))
        .route("/api/v1/wizard/finalize", post(wizard::finalize))

        // Client preferences
        .route("/api/v1/preferences/language", get(preferences::get_language).put(preferences::set_language))

        // Organizer: events
        .route("/api/v1/events", get(event::list_events))
        .route("/api/v1/events/{id}", get(event::get_event).put(event::update_event).delete(event::delete_event))
        .route("/api/v1/events/{id}/settings", get(settings::get_settings).put(settings::update_settings))
        .route("/api/v1/events/{id}/co-organizers", get(settings::list_co_organizers).put(settings::replace_co_organizers))
        .route("/api/v1/events/{id}/stats", get(stats::get_stats))
        .route("/api/v1/events/{id}/live", get(live::live_guest_list))
        .route("/api/v1/events/{id}/share", get(share::get_share_links))
        .route("/api/v1/events/{id}/share/personal", post(share::create_personal_share))
        .route("/api/v1/events/{id}/notifications", get(notification::list_notifications))

        // Organizer: guest list
        .route("/api/v1/events/{id}/guests", get(guest::list_guests).post(guest::add_guest))
        .route("/api/v1/events/{id}/guests/import", post(guest::import_guests))
        .route("/api/v1/events/{id}/guests/message", post(guest::bulk_message))
        .route("/api/v1/rsvps/{id}", delete(guest::delete_rsvp))
        .route("/api/v1/rsvps/{id}/status", put(guest::update_status))
        .route("/api/v1/rsvps/{id}/history", get(guest::rsvp_history))
        .route("/api/v1/rsvps/{id}/reminders", get(rsvp::get_reminders).put(rsvp::update_reminders))

        // Public invitation page
        .route("/api/v1/public/events/{short_id}", get(event::get_public_event))
        .route("/api/v1/public/events/{short_id}/rsvp", post(rsvp::respond))
        .route("/api/v1/public/events/{short_id}/calendar.ics", get(calendar::download_ics))
        .route("/api/v1/public/events/{short_id}/calendar/google", get(calendar::google_calendar_link))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
