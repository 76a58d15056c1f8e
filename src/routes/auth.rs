use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::{CurrentUser, SESSION_COOKIE};
use crate::models::user::{NewUser, User};
use crate::services::AppService;
use crate::state::AppState;

use super::{base_ctx, render};

pub fn router<S: AppService>() -> Router<AppState<S>> {
    Router::new()
        .route("/auth/signup/", get(signup_form::<S>).post(signup::<S>))
        .route("/auth/login/", get(login_form::<S>).post(login::<S>))
        .route("/auth/logout/", get(logout::<S>))
        .route(
            "/auth/password_change/",
            get(password_change_form::<S>).post(password_change::<S>),
        )
}

#[derive(Deserialize)]
struct SignupForm {
    username: String,
    email: String,
    password1: String,
    password2: String,
}

impl SignupForm {
    fn validate(&self) -> Result<(), String> {
        User::validate_username(self.username.trim()).map_err(|e| e.to_string())?;
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err("Enter a valid email address".into());
        }
        User::validate_password(&self.password1).map_err(|e| e.to_string())?;
        if self.password1 != self.password2 {
            return Err("The two password fields didn't match".into());
        }
        Ok(())
    }
}

fn signup_page<S: AppService>(
    st: &AppState<S>,
    username: &str,
    email: &str,
    error: &str,
) -> Result<Response, AppError> {
    let mut ctx = base_ctx(&None);
    ctx.insert("form_username", username);
    ctx.insert("form_email", email);
    ctx.insert("error", error);
    Ok(Html(render(&st.tera, "users/signup.html", &ctx)?).into_response())
}

async fn signup_form<S: AppService>(
    State(st): State<AppState<S>>,
) -> Result<Response, AppError> {
    signup_page(&st, "", "", "")
}

#[tracing::instrument(skip_all)]
async fn signup<S: AppService>(
    State(st): State<AppState<S>>,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    if let Err(msg) = form.validate() {
        return signup_page(&st, &form.username, &form.email, &msg);
    }

    let username = form.username.trim();
    if st.svc.user_by_username(username).await?.is_some() {
        return signup_page(&st, username, &form.email, "That username is already taken");
    }

    let user = st
        .svc
        .create_user(NewUser {
            username: username.to_string(),
            email: form.email.trim().to_string(),
            password_hash: User::hash_password(&form.password1),
        })
        .await?;
    info!(user = %user.username, "account created");

    Ok(Redirect::to("/auth/login/").into_response())
}

#[derive(Deserialize)]
struct LoginNext {
    next: Option<String>,
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
    #[serde(default)]
    next: Option<String>,
}

fn login_page<S: AppService>(
    st: &AppState<S>,
    username: &str,
    next: &str,
    error: &str,
) -> Result<Response, AppError> {
    let mut ctx = base_ctx(&None);
    ctx.insert("form_username", username);
    ctx.insert("next", next);
    ctx.insert("error", error);
    Ok(Html(render(&st.tera, "users/login.html", &ctx)?).into_response())
}

async fn login_form<S: AppService>(
    State(st): State<AppState<S>>,
    Query(q): Query<LoginNext>,
) -> Result<Response, AppError> {
    login_page(&st, "", q.next.as_deref().unwrap_or(""), "")
}

#[tracing::instrument(skip_all)]
async fn login<S: AppService>(
    State(st): State<AppState<S>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = form.next.as_deref().unwrap_or("");

    let user = st
        .svc
        .user_by_username(form.username.trim())
        .await?
        .filter(|u| u.verify_password(&form.password));
    let Some(user) = user else {
        return login_page(&st, &form.username, next, "Invalid username or password");
    };

    let session = st.svc.create_session(user.id, st.session_ttl).await?;
    info!(user = %user.username, "logged in");

    let mut cookie = Cookie::new(SESSION_COOKIE, session.id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    let jar = jar.add(cookie);

    // Only follow local redirect targets.
    let target = if next.starts_with('/') { next } else { "/" };
    Ok((jar, Redirect::to(target)).into_response())
}

async fn logout<S: AppService>(
    State(st): State<AppState<S>>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Ok(session_id) = Uuid::parse_str(cookie.value()) {
            st.svc.delete_session(session_id).await?;
        }
    }

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    let jar = jar.remove(removal);

    let body = render(&st.tera, "users/logged_out.html", &base_ctx(&None))?;
    Ok((jar, Html(body)).into_response())
}

#[derive(Deserialize)]
struct PasswordChangeForm {
    old_password: String,
    new_password1: String,
    new_password2: String,
}

fn password_change_page<S: AppService>(
    st: &AppState<S>,
    me: &User,
    error: &str,
    done: bool,
) -> Result<Response, AppError> {
    let mut ctx = base_ctx(&Some(me.clone()));
    ctx.insert("error", error);
    ctx.insert("done", &done);
    Ok(Html(render(&st.tera, "users/password_change.html", &ctx)?).into_response())
}

async fn password_change_form<S: AppService>(
    State(st): State<AppState<S>>,
    CurrentUser(me): CurrentUser,
) -> Result<Response, AppError> {
    password_change_page(&st, &me, "", false)
}

#[tracing::instrument(skip_all)]
async fn password_change<S: AppService>(
    State(st): State<AppState<S>>,
    CurrentUser(me): CurrentUser,
    Form(form): Form<PasswordChangeForm>,
) -> Result<Response, AppError> {
    if !me.verify_password(&form.old_password) {
        return password_change_page(&st, &me, "Your old password was entered incorrectly", false);
    }
    if let Err(msg) = User::validate_password(&form.new_password1) {
        return password_change_page(&st, &me, &msg.to_string(), false);
    }
    if form.new_password1 != form.new_password2 {
        return password_change_page(&st, &me, "The two password fields didn't match", false);
    }

    st.svc
        .update_password(me.id, User::hash_password(&form.new_password1))
        .await?;
    info!(user = %me.username, "password changed");

    password_change_page(&st, &me, "", true)
}
