pub mod about;
pub mod auth;
pub mod posts;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use tera::{Context, Tera};

use crate::error::AppError;
use crate::middleware::auth::MaybeUser;
use crate::models::user::User;
use crate::services::AppService;
use crate::state::AppState;

pub fn router<S: AppService>() -> Router<AppState<S>> {
    Router::new()
        .merge(posts::router())
        .merge(auth::router())
        .merge(about::router())
        .fallback(not_found_handler::<S>)
}

/// Context every template starts from; `user` drives the nav bar.
pub(crate) fn base_ctx(user: &Option<User>) -> Context {
    let mut ctx = Context::new();
    ctx.insert("user", user);
    ctx
}

pub(crate) fn render(tera: &Tera, name: &str, ctx: &Context) -> Result<String, AppError> {
    Ok(tera.render(name, ctx)?)
}

pub(crate) fn not_found<S: AppService>(
    st: &AppState<S>,
    user: &Option<User>,
) -> Result<Response, AppError> {
    let body = render(&st.tera, "core/404.html", &base_ctx(user))?;
    Ok((StatusCode::NOT_FOUND, Html(body)).into_response())
}

async fn not_found_handler<S: AppService>(
    State(st): State<AppState<S>>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, AppError> {
    not_found(&st, &user)
}
