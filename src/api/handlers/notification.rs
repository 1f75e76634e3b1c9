use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::handlers::event::load_owned_event;
use crate::error::AppError;
use std::sync::Arc;

/// Most recent delivery attempts for the event, newest first.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;
    let records = state.notification_service.history(&event.id).await?;
    Ok(Json(records))
}
