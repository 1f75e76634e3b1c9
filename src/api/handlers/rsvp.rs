use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::ReminderSettingsRequest;
use crate::api::handlers::event::load_public_event;
use crate::domain::models::{auth::SessionUser, event::Event, rsvp::Rsvp, settings::ReminderSettings};
use crate::domain::services::rsvp_service::RsvpAnswer;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;

/// The caller's own answer for the invitation. Repeating it updates the same row.
pub async fn respond(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(short_id): Path<String>,
    Json(answer): Json<RsvpAnswer>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_public_event(&state, &short_id, Some(&user)).await?;
    if event.is_temporary {
        return Err(AppError::Validation("This event is not published yet".into()));
    }

    let rsvp = state.rsvp_service.respond(&event, &user, answer, Utc::now()).await?;
    Ok(Json(rsvp))
}

/// The respondent and the organizer may both manage a guest's reminder preferences.
async fn load_reminder_target(state: &AppState, rsvp_id: &str, user: &SessionUser) -> Result<(Event, Rsvp), AppError> {
    let rsvp = state.rsvp_service.find(rsvp_id).await?;
    let event = state.event_repo.find_by_id(&rsvp.event_id).await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;

    let is_respondent = rsvp.user_id.as_deref() == Some(user.id.as_str());
    if !is_respondent && !event.is_owned_by(&user.id) {
        return Err(AppError::NotFound("RSVP not found".into()));
    }
    Ok((event, rsvp))
}

pub async fn get_reminders(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(rsvp_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (_event, rsvp) = load_reminder_target(&state, &rsvp_id, &user).await?;
    let settings = state.notification_service.reminder_settings(&rsvp.id).await?;
    Ok(Json(settings))
}

pub async fn update_reminders(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(rsvp_id): Path<String>,
    Json(payload): Json<ReminderSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (event, rsvp) = load_reminder_target(&state, &rsvp_id, &user).await?;
    let current = state.notification_service.reminder_settings(&rsvp.id).await?;

    let settings = ReminderSettings {
        email_reminders: payload.email_reminders.unwrap_or(current.email_reminders),
        whatsapp_reminders: payload.whatsapp_reminders.unwrap_or(current.whatsapp_reminders),
        one_week_reminder: payload.one_week_reminder.unwrap_or(current.one_week_reminder),
        one_day_reminder: payload.one_day_reminder.unwrap_or(current.one_day_reminder),
        update_notifications: payload.update_notifications.unwrap_or(current.update_notifications),
        updated_at: Utc::now(),
        ..current
    };

    let saved = state.rsvp_service.save_reminder_settings(&event, &rsvp, &settings).await?;
    Ok(Json(saved))
}
