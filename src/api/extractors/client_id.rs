use axum::{extract::FromRequestParts, http::request::Parts};
use crate::error::AppError;

pub const CLIENT_ID_HEADER: &str = "X-Client-Id";
const MAX_CLIENT_ID_LEN: usize = 128;

/// Opaque per-browser id that scopes client storage.
pub struct ClientId(pub String);

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts.headers.get(CLIENT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if value.is_empty() || value.len() > MAX_CLIENT_ID_LEN {
            return Err(AppError::Validation(format!("{} header is required (1-128 characters)", CLIENT_ID_HEADER)));
        }

        Ok(ClientId(value.to_string()))
    }
}
