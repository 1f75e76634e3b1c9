use axum::{extract::{State, Path}, response::IntoResponse, Json, http::header};
use crate::state::AppState;
use crate::api::extractors::maybe_auth::MaybeAuthUser;
use crate::api::dtos::responses::GoogleCalendarResponse;
use crate::api::handlers::event::load_public_event;
use crate::domain::services::calendar::{generate_ics, google_calendar_url, ics_filename};
use crate::error::AppError;
use std::sync::Arc;

pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(short_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_public_event(&state, &short_id, user.as_ref()).await?;
    let body = generate_ics(&event)?;
    let disposition = format!("attachment; filename=\"{}\"", ics_filename(&event).replace('"', ""));

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

pub async fn google_calendar_link(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(short_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_public_event(&state, &short_id, user.as_ref()).await?;
    Ok(Json(GoogleCalendarResponse { url: google_calendar_url(&event)? }))
}
