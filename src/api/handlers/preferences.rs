use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::client_id::ClientId;
use crate::api::dtos::{requests::LanguageRequest, responses::LanguageResponse};
use crate::error::AppError;
use std::sync::Arc;

pub const KEY_LANGUAGE: &str = "language";

pub async fn get_language(
    State(state): State<Arc<AppState>>,
    ClientId(client_id): ClientId,
) -> Result<impl IntoResponse, AppError> {
    let language = state.client_storage.get(&client_id, KEY_LANGUAGE).await?;
    Ok(Json(LanguageResponse { language }))
}

pub async fn set_language(
    State(state): State<Arc<AppState>>,
    ClientId(client_id): ClientId,
    Json(payload): Json<LanguageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let language = payload.language.trim();
    let well_formed = !language.is_empty()
        && language.len() <= 16
        && language.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !well_formed {
        return Err(AppError::Validation("Invalid language tag".into()));
    }

    state.client_storage.set(&client_id, KEY_LANGUAGE, language).await?;
    Ok(Json(LanguageResponse { language: Some(language.to_string()) }))
}
