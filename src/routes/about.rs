use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::AppError;
use crate::middleware::auth::MaybeUser;
use crate::services::AppService;
use crate::state::AppState;

use super::{base_ctx, render};

pub fn router<S: AppService>() -> Router<AppState<S>> {
    Router::new()
        .route("/about/author/", get(author::<S>))
        .route("/about/tech/", get(tech::<S>))
}

async fn author<S: AppService>(
    State(st): State<AppState<S>>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, AppError> {
    Ok(Html(render(&st.tera, "about/author.html", &base_ctx(&user))?).into_response())
}

async fn tech<S: AppService>(
    State(st): State<AppState<S>>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, AppError> {
    Ok(Html(render(&st.tera, "about/tech.html", &base_ctx(&user))?).into_response())
}
