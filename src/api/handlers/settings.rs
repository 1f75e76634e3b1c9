use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{ReplaceCoOrganizersRequest, UpdateSettingsRequest};
use crate::api::handlers::event::load_owned_event;
use crate::domain::models::settings::{CoOrganizer, EventSettings};
use crate::domain::services::guest_import::is_valid_email;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;
    let settings = state.rsvp_service.event_settings(&event.id).await?;
    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;
    let current = state.rsvp_service.event_settings(&event.id).await?;

    let settings = EventSettings {
        event_id: event.id.clone(),
        show_guest_list: payload.show_guest_list.unwrap_or(current.show_guest_list),
        allow_plus_ones: payload.allow_plus_ones.unwrap_or(current.allow_plus_ones),
        show_dietary_restrictions: payload.show_dietary_restrictions.unwrap_or(current.show_dietary_restrictions),
        // a null deadline clears it
        rsvp_deadline: payload.rsvp_deadline,
        updated_at: Utc::now(),
    };

    let saved = state.settings_repo.upsert_settings(&settings).await?;
    info!(event_id = %event.id, "Event settings saved");
    Ok(Json(saved))
}

pub async fn list_co_organizers(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;
    let organizers = state.settings_repo.list_co_organizers(&event.id).await?;
    Ok(Json(organizers))
}

pub async fn replace_co_organizers(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
    Json(payload): Json<ReplaceCoOrganizersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;

    let mut organizers = Vec::with_capacity(payload.co_organizers.len());
    for input in payload.co_organizers {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Co-organizer name is required".into()));
        }
        let email = input.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        if email.as_deref().is_some_and(|e| !is_valid_email(e)) {
            return Err(AppError::Validation("Invalid co-organizer email".into()));
        }
        let avatar_url = input.avatar_url.filter(|u| !u.trim().is_empty());
        organizers.push(CoOrganizer::new(event.id.clone(), name, email, avatar_url));
    }

    let saved = state.settings_repo.replace_co_organizers(&event.id, &organizers).await?;
    info!(event_id = %event.id, count = saved.len(), "Co-organizers replaced");
    Ok(Json(saved))
}
