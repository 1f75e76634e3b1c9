use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::{
    requests::{BulkMessageRequest, ImportGuestsRequest, StatusUpdateRequest},
    responses::{BulkMessageResponse, ImportResponse},
};
use crate::api::handlers::event::{load_owned_event, load_owned_rsvp};
use crate::domain::models::{notification::{Channel, NotificationRecord}, rsvp::Rsvp};
use crate::domain::services::{
    notification_service::{Draft, NotificationService, STATUS_FAILED, STATUS_SENT, STATUS_SKIPPED},
    rsvp_service::NewGuest,
};
use crate::domain::models::event::Event;
use crate::error::AppError;
use std::sync::Arc;

pub async fn list_guests(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;
    let guests = state.rsvp_service.list(&event.id).await?;
    Ok(Json(guests))
}

pub async fn add_guest(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
    Json(payload): Json<NewGuest>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;
    let guest = state.rsvp_service.add_guest(&event, payload).await?;
    Ok((StatusCode::CREATED, Json(guest)))
}

pub async fn import_guests(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
    Json(payload): Json<ImportGuestsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;
    let guests = state.rsvp_service.import(&event, &payload.text).await?;
    Ok((StatusCode::CREATED, Json(ImportResponse { imported: guests.len(), guests })))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(rsvp_id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (event, rsvp) = load_owned_rsvp(&state, &rsvp_id, &user).await?;
    let updated = state.rsvp_service.update_status(&event, &rsvp.id, payload.status, Some(&user.id)).await?;
    Ok(Json(updated))
}

pub async fn delete_rsvp(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(rsvp_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (_event, rsvp) = load_owned_rsvp(&state, &rsvp_id, &user).await?;
    state.rsvp_service.delete(&rsvp.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rsvp_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(rsvp_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (_event, rsvp) = load_owned_rsvp(&state, &rsvp_id, &user).await?;
    let history = state.rsvp_service.history(&rsvp.id).await?;
    Ok(Json(history))
}

pub async fn bulk_message(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
    Json(payload): Json<BulkMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;

    let guests = state.rsvp_service.list(&event.id).await?;
    let recipients: Vec<Rsvp> = guests.into_iter()
        .filter(|g| payload.rsvp_ids.contains(&g.id))
        .collect();
    if recipients.len() != payload.rsvp_ids.len() {
        return Err(AppError::Validation("Some selected guests are not on this event".into()));
    }

    let draft = Draft { subject: payload.subject, body: payload.body };
    let records = send_bulk(&state.notification_service, &event, &recipients, &payload.channels, &draft).await?;
    Ok(Json(summarize(records)))
}

/// Shared by the HTTP endpoint and the live session.
pub async fn send_bulk(
    notifications: &NotificationService,
    event: &Event,
    recipients: &[Rsvp],
    channels: &[Channel],
    draft: &Draft,
) -> Result<Vec<NotificationRecord>, AppError> {
    if recipients.is_empty() {
        return Err(AppError::Validation("Select at least one guest".into()));
    }
    if channels.is_empty() {
        return Err(AppError::Validation("Choose email and/or WhatsApp".into()));
    }
    if draft.body.trim().is_empty() {
        return Err(AppError::Validation("Message cannot be empty".into()));
    }
    notifications.bulk_message(event, recipients, channels, draft).await
}

pub fn summarize(records: Vec<NotificationRecord>) -> BulkMessageResponse {
    let count = |status: &str| records.iter().filter(|r| r.status == status).count();
    BulkMessageResponse {
        sent: count(STATUS_SENT),
        failed: count(STATUS_FAILED),
        skipped: count(STATUS_SKIPPED),
        records,
    }
}
