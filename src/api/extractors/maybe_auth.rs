use axum::{
    extract::{FromRequestParts, FromRef},
    http::request::Parts,
};
use crate::state::AppState;
use crate::domain::models::auth::SessionUser;
use crate::api::extractors::auth::access_claims;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, Span};

/// Session if there is a valid one; anonymous otherwise. Never rejects.
pub struct MaybeAuthUser(pub Option<SessionUser>);

impl MaybeAuthUser {
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        match access_claims(parts, &app_state) {
            Ok(Some(claims)) => {
                Span::current().record("user_id", claims.sub.as_str());
                Ok(MaybeAuthUser(Some(SessionUser::from(claims))))
            }
            Ok(None) => Ok(MaybeAuthUser(None)),
            Err(e) => {
                // expired or tampered tokens are treated as anonymous
                debug!("MaybeAuth: ignoring access token: {}", e);
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
