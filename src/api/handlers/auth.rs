use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{LoginRequest, SignupRequest};
use crate::api::extractors::auth::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::domain::models::auth::{AuthResponse, SessionUser};
use crate::domain::services::auth_service::TokenPair;
use std::sync::Arc;
use tower_cookies::{Cookies, Cookie};
use tower_cookies::cookie::SameSite;
use time::Duration;
use tracing::info;

pub async fn signup(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, tokens) = state.auth_service
        .signup(&payload.email, &payload.password, &payload.display_name)
        .await?;

    set_cookies(&cookies, &tokens);
    info!(user_id = %user.id, "User signed up");

    Ok((StatusCode::CREATED, Json(AuthResponse {
        csrf_token: tokens.csrf_token,
        user: SessionUser::from(&user),
    })))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (user, tokens) = state.auth_service.login(&payload.email, &payload.password).await?;

    set_cookies(&cookies, &tokens);
    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        csrf_token: tokens.csrf_token,
        user: SessionUser::from(&user),
    }))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let raw_token = cookies.get(REFRESH_COOKIE)
        .ok_or(AppError::Unauthorized)?
        .value()
        .to_string();

    let (user, tokens) = state.auth_service.refresh(&raw_token).await?;

    set_cookies(&cookies, &tokens);
    info!(user_id = %user.id, "Token refreshed");

    Ok(Json(AuthResponse {
        csrf_token: tokens.csrf_token,
        user: SessionUser::from(&user),
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = cookies.get(REFRESH_COOKIE) {
        state.auth_service.logout(cookie.value()).await?;
    }

    cookies.remove(Cookie::build((ACCESS_COOKIE, "")).path("/").into());
    cookies.remove(Cookie::build((REFRESH_COOKIE, "")).path("/").into());

    info!("User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Current session from the access cookie, with the CSRF token the client must echo.
pub async fn session(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let token = cookies.get(ACCESS_COOKIE).ok_or(AppError::Unauthorized)?;
    let claims = state.auth_service.verify_access(token.value())?;

    Ok(Json(AuthResponse {
        csrf_token: claims.csrf.clone(),
        user: SessionUser::from(claims),
    }))
}

fn set_cookies(cookies: &Cookies, tokens: &TokenPair) {
    cookies.add(session_cookie(ACCESS_COOKIE, &tokens.access_token, Duration::minutes(15)));
    cookies.add(session_cookie(REFRESH_COOKIE, &tokens.refresh_token, Duration::days(7)));
}

fn session_cookie(name: &'static str, value: &str, max_age: Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value.to_string());
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie.set_max_age(max_age);
    cookie
}
