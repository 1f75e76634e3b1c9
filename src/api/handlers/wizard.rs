use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, client_id::ClientId, maybe_auth::MaybeAuthUser};
use crate::api::dtos::{
    requests::{BeginDraftRequest, FinalizeRequest},
    responses::{FinalizeResponse, ResumeResponse, WizardResponse},
};
use crate::domain::services::{
    rsvp_service::NewGuest,
    wizard::{self, Advance, EventWizard},
};
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

/// Creates (or returns) the placeholder event for this draft token.
pub async fn begin_draft(
    State(state): State<Arc<AppState>>,
    ClientId(client_id): ClientId,
    AuthUser(user): AuthUser,
    Json(payload): Json<BeginDraftRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.drafts.begin_draft(&client_id, &payload.draft_token, &user.id).await?;
    Ok(Json(event))
}

pub async fn next(
    State(state): State<Arc<AppState>>,
    ClientId(client_id): ClientId,
    session: MaybeAuthUser,
    Json(mut wizard): Json<EventWizard>,
) -> Result<impl IntoResponse, AppError> {
    let result = wizard.next(session.is_authenticated(), Utc::now())?;

    if result == Advance::AuthRequired {
        wizard::suspend_for_auth(state.client_storage.as_ref(), &client_id, &wizard).await?;
        info!(client_id = %client_id, "Wizard parked until sign-in");
    }

    Ok(Json(WizardResponse { result, wizard }))
}

pub async fn back(Json(mut wizard): Json<EventWizard>) -> Result<impl IntoResponse, AppError> {
    let step = wizard.back()?;
    Ok(Json(WizardResponse { result: Advance::Moved(step), wizard }))
}

pub async fn resume(
    State(state): State<Arc<AppState>>,
    ClientId(client_id): ClientId,
    session: MaybeAuthUser,
) -> Result<impl IntoResponse, AppError> {
    let wizard = wizard::resume(state.client_storage.as_ref(), &client_id, session.is_authenticated()).await?;
    Ok(Json(ResumeResponse { restored: wizard.is_some(), wizard }))
}

/// Turns the wizard data into a real event. Guests collected in the wizard are
/// inserted only when no placeholder existed to hold them already.
pub async fn finalize(
    State(state): State<Arc<AppState>>,
    ClientId(client_id): ClientId,
    AuthUser(user): AuthUser,
    Json(payload): Json<FinalizeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let finalized = state.drafts.finalize(&client_id, &user.id, &payload.data, Utc::now()).await?;

    let guests_imported = if finalized.created && !payload.data.guests.is_empty() {
        let guests = payload.data.guests.into_iter()
            .map(|g| NewGuest { name: g.name, email: g.email, phone: g.phone })
            .collect();
        state.rsvp_service.add_guests(&finalized.event, guests).await?.len()
    } else {
        0
    };

    Ok(Json(FinalizeResponse {
        event: finalized.event,
        created: finalized.created,
        guests_imported,
    }))
}
