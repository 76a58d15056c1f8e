use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::models::user::User;
use crate::services::AppService;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sessionid";

/// Extractor for views that require a signed-in user. Anonymous requests
/// are bounced to the login page with a `next` parameter pointing back at
/// the page they asked for.
pub struct CurrentUser(pub User);

/// Extractor for views that render for everyone but adapt to the viewer.
pub struct MaybeUser(pub Option<User>);

async fn session_user<S: AppService>(parts: &Parts, state: &AppState<S>) -> Option<User> {
    let jar = CookieJar::from_headers(&parts.headers);
    let raw = jar.get(SESSION_COOKIE)?.value().to_string();
    let session_id = Uuid::parse_str(&raw).ok()?;
    // An expired or unknown session is the same as no session.
    state.svc.session_user(session_id).await.ok().flatten()
}

#[async_trait]
impl<S: AppService> FromRequestParts<AppState<S>> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(Redirect::to(&format!(
                "/auth/login/?next={}",
                parts.uri.path()
            ))),
        }
    }
}

#[async_trait]
impl<S: AppService> FromRequestParts<AppState<S>> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(session_user(parts, state).await))
    }
}
