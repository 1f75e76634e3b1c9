use axum::{extract::{State, Path, Query}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, maybe_auth::MaybeAuthUser};
use crate::api::dtos::{requests::{PublicEventQuery, UpdateEventRequest}, responses::{PublicEventResponse, PublicGuest}};
use crate::domain::models::{auth::SessionUser, event::{parse_time_of_day, Event}, rsvp::{Rsvp, RsvpStatus}, settings::EventSettings};
use crate::error::AppError;
use std::sync::Arc;
use std::time::Instant;
use chrono::Utc;
use chrono_tz::Tz;
use tracing::info;

/// Loads an event the caller owns. Other users get a 404 rather than a hint that it exists.
pub async fn load_owned_event(state: &AppState, event_id: &str, user: &SessionUser) -> Result<Event, AppError> {
    state.event_repo.find_by_id(event_id).await?
        .filter(|event| event.is_owned_by(&user.id))
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Resolves the RSVP and its event, requiring the caller to own the event.
pub async fn load_owned_rsvp(state: &AppState, rsvp_id: &str, user: &SessionUser) -> Result<(Event, Rsvp), AppError> {
    let rsvp = state.rsvp_service.find(rsvp_id).await?;
    let event = load_owned_event(state, &rsvp.event_id, user).await?;
    Ok((event, rsvp))
}

/// Placeholders and private events are only visible to their owner.
pub fn is_visible_to(event: &Event, user: Option<&SessionUser>) -> bool {
    if user.is_some_and(|u| event.is_owned_by(&u.id)) {
        return true;
    }
    !event.is_temporary && !event.is_private
}

pub async fn load_public_event(state: &AppState, short_id: &str, user: Option<&SessionUser>) -> Result<Event, AppError> {
    state.event_repo.find_by_short_id(short_id).await?
        .filter(|event| is_visible_to(event, user))
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let events = state.event_repo.list_by_owner(&user.id).await?;
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;
    Ok(Json(event))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut event = load_owned_event(&state, &event_id, &user).await?;
    let previous_start = event.starts_at();
    apply_update(&mut event, payload)?;

    let updated = state.event_repo.update(&event).await?;
    if updated.starts_at() != previous_start {
        state.rsvp_service.reschedule_event(&updated).await?;
    }
    info!(event_id = %updated.id, "Event updated");
    Ok(Json(updated))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;
    let started = Instant::now();
    let removed = state.rsvp_service.list(&event.id).await?;
    state.event_repo.delete(&event.id).await?;
    state.rsvp_service.publish_removed(removed, started);
    state.stats.invalidate(&event.id);

    info!(event_id = %event.id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Invitation page payload. The guest list is included only when the organizer shows it.
pub async fn get_public_event(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(short_id): Path<String>,
    Query(query): Query<PublicEventQuery>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_public_event(&state, &short_id, user.as_ref()).await?;

    // personal links carry ?ref=<share code>; unknown or foreign codes are ignored
    let shared_by = match query.share_code.as_deref() {
        Some(code) => state.share_repo.find_by_code(code).await?
            .filter(|share| share.event_id == event.id)
            .map(|share| share.shared_by),
        None => None,
    };
    if let Some(sharer) = &shared_by {
        info!(event_id = %event.id, shared_by = %sharer, "Invitation opened from a personal link");
    }

    let settings = state.settings_repo.find_settings(&event.id).await?
        .unwrap_or_else(|| EventSettings::defaults_for(&event.id));
    let co_organizers = state.settings_repo.list_co_organizers(&event.id).await?;

    let my_rsvp = match &user {
        Some(u) => state.rsvp_repo.find_by_respondent(&event.id, &u.id).await?,
        None => None,
    };

    let guests = if settings.show_guest_list {
        let rows = state.rsvp_service.list(&event.id).await?;
        Some(rows.into_iter()
            .filter(|r| matches!(r.status(), RsvpStatus::Confirmed | RsvpStatus::Maybe))
            .map(|r| PublicGuest {
                dietary_restrictions: r.dietary_restrictions.filter(|_| settings.show_dietary_restrictions),
                name: r.name,
                status: r.status,
                guests_count: r.guests_count,
            })
            .collect())
    } else {
        None
    };

    Ok(Json(PublicEventResponse { event, settings, co_organizers, guests, my_rsvp, shared_by }))
}

fn apply_update(event: &mut Event, payload: UpdateEventRequest) -> Result<(), AppError> {
    if let Some(title) = payload.title {
        if title.trim().chars().count() < 2 {
            return Err(AppError::Validation("Title must be at least 2 characters".into()));
        }
        event.title = title.trim().to_string();
    }
    if let Some(description) = payload.description {
        event.description = description.trim().to_string();
    }
    if let Some(event_type) = payload.event_type {
        if event_type.trim().is_empty() {
            return Err(AppError::Validation("Event type cannot be empty".into()));
        }
        event.event_type = event_type.trim().to_string();
    }
    if let Some(date) = payload.event_date {
        event.event_date = date;
    }
    if let Some(start) = payload.start_time {
        if parse_time_of_day(&start).is_none() {
            return Err(AppError::Validation(format!("Invalid time '{}', expected HH:MM", start)));
        }
        event.start_time = start.trim().to_string();
    }
    if let Some(end) = payload.end_time {
        let end = end.trim();
        if end.is_empty() {
            event.end_time = None;
        } else if parse_time_of_day(end).is_none() {
            return Err(AppError::Validation(format!("Invalid time '{}', expected HH:MM", end)));
        } else {
            event.end_time = Some(end.to_string());
        }
    }
    if let Some(timezone) = payload.timezone {
        if timezone.parse::<Tz>().is_err() {
            return Err(AppError::Validation("Invalid timezone".into()));
        }
        event.timezone = timezone;
    }
    if let Some(location) = payload.location {
        event.location = location.trim().to_string();
    }
    if let Some(capacity) = payload.capacity {
        if capacity <= 0 {
            return Err(AppError::Validation("Capacity must be positive".into()));
        }
        event.capacity = capacity;
    }
    if let Some(url) = payload.banner_image_url {
        event.banner_image_url = Some(url).filter(|u| !u.trim().is_empty());
    }
    if let Some(is_private) = payload.is_private {
        event.is_private = is_private;
    }
    if let Some(deadline) = payload.save_the_date_deadline {
        event.save_the_date_deadline = Some(deadline);
    }
    if let Some(message) = payload.save_the_date_message {
        event.save_the_date_message = Some(message.trim().to_string()).filter(|m| !m.is_empty());
    }

    if let Some(deadline) = event.save_the_date_deadline {
        if deadline >= event.event_date {
            return Err(AppError::Validation("Save-the-date deadline must be before the event date".into()));
        }
        if event.save_the_date_message.is_none() {
            return Err(AppError::Validation("Save-the-date message is required when a deadline is set".into()));
        }
    }

    event.updated_at = Utc::now();
    Ok(())
}
