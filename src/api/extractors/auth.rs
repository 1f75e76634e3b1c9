use axum::{
    extract::{FromRequestParts, FromRef},
    http::{request::Parts, Method},
};
use crate::state::AppState;
use crate::domain::models::auth::{Claims, SessionUser};
use crate::error::AppError;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::Span;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// The signed-in caller. Rejects with 401 without a valid access token and
/// with 403 when a state-changing request lacks the matching CSRF header.
pub struct AuthUser(pub SessionUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let claims = access_claims(parts, &app_state)?.ok_or(AppError::Unauthorized)?;

        if requires_csrf(&parts.method) {
            let header = parts.headers.get(CSRF_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| AppError::Forbidden("Missing CSRF token".into()))?;

            if header != claims.csrf {
                return Err(AppError::Forbidden("Invalid CSRF token".into()));
            }
        }

        Span::current().record("user_id", claims.sub.as_str());
        Ok(AuthUser(SessionUser::from(claims)))
    }
}

fn requires_csrf(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Decoded access-token claims, `None` when no cookie is present.
pub(crate) fn access_claims(parts: &Parts, state: &AppState) -> Result<Option<Claims>, AppError> {
    let cookies = parts.extensions.get::<Cookies>()
        .ok_or_else(|| AppError::InternalWithMsg("cookie layer missing".into()))?;

    match cookies.get(ACCESS_COOKIE) {
        Some(cookie) => state.auth_service.verify_access(cookie.value()).map(Some),
        None => Ok(None),
    }
}
