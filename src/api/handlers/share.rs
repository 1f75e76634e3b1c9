use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::responses::{PersonalShareResponse, ShareResponse};
use crate::api::handlers::event::{is_visible_to, load_owned_event};
use crate::domain::models::share::EventShare;
use crate::domain::services::{calendar::google_calendar_url, share};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn get_share_links(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;
    let link = share::public_url(&state.config.public_base_url, &event);

    Ok(Json(ShareResponse {
        google_calendar_url: google_calendar_url(&event)?,
        links: share::build_links(&event, link),
    }))
}

/// Records who shared the invitation and returns links tagged with their share code.
pub async fn create_personal_share(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_repo.find_by_id(&event_id).await?
        .filter(|event| is_visible_to(event, Some(&user)))
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;

    let record = state.share_repo.create(&EventShare::new(event.id.clone(), user.id.clone())).await?;
    info!(event_id = %event.id, share_code = %record.share_code, "Personal share link created");

    let link = share::personal_url(&state.config.public_base_url, &event, &record.share_code);
    Ok((StatusCode::CREATED, Json(PersonalShareResponse {
        share_code: record.share_code,
        links: share::build_links(&event, link),
    })))
}
