use axum::extract::{Multipart, Path, Query, State};
use axum::http::Uri;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::middleware::auth::{CurrentUser, MaybeUser};
use crate::models::comment::NewComment;
use crate::models::post::{NewPost, PostChanges};
use crate::models::user::User;
use crate::pagination::PageQuery;
use crate::services::{AppService, PostFilter};
use crate::state::AppState;

use super::{base_ctx, not_found, render};

pub fn router<S: AppService>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(index::<S>))
        .route("/group/:slug/", get(group_list::<S>))
        .route("/profile/:username/", get(profile::<S>))
        .route("/profile/:username/follow/", get(profile_follow::<S>))
        .route("/profile/:username/unfollow/", get(profile_unfollow::<S>))
        .route("/posts/:id/", get(post_detail::<S>))
        .route(
            "/posts/:id/edit/",
            get(post_edit_form::<S>).post(post_edit::<S>),
        )
        .route("/posts/:id/comment/", post(add_comment::<S>))
        .route(
            "/create/",
            get(post_create_form::<S>).post(post_create::<S>),
        )
        .route("/follow/", get(follow_index::<S>))
}

async fn index<S: AppService>(
    State(st): State<AppState<S>>,
    MaybeUser(user): MaybeUser,
    Query(pq): Query<PageQuery>,
    uri: Uri,
) -> Result<Response, AppError> {
    // The index is the hottest page; serve the cached render when the TTL
    // allows. Keyed on the full URI so each page number caches separately.
    let key = uri.to_string();
    if let Some(body) = st.cache.get(&key) {
        return Ok(Html(body).into_response());
    }

    let page = st.svc.page_of_posts(PostFilter::All, pq.number()).await?;
    let mut ctx = base_ctx(&user);
    ctx.insert("page", &page);
    let body = render(&st.tera, "posts/index.html", &ctx)?;
    st.cache.put(key, body.clone());
    Ok(Html(body).into_response())
}

async fn group_list<S: AppService>(
    State(st): State<AppState<S>>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
    Query(pq): Query<PageQuery>,
) -> Result<Response, AppError> {
    let Some(group) = st.svc.group_by_slug(&slug).await? else {
        return not_found(&st, &user);
    };

    let page = st
        .svc
        .page_of_posts(PostFilter::InGroup(group.id), pq.number())
        .await?;
    let mut ctx = base_ctx(&user);
    ctx.insert("group", &group);
    ctx.insert("page", &page);
    Ok(Html(render(&st.tera, "posts/group_list.html", &ctx)?).into_response())
}

async fn profile<S: AppService>(
    State(st): State<AppState<S>>,
    MaybeUser(user): MaybeUser,
    Path(username): Path<String>,
    Query(pq): Query<PageQuery>,
) -> Result<Response, AppError> {
    let Some(author) = st.svc.user_by_username(&username).await? else {
        return not_found(&st, &user);
    };

    let page = st
        .svc
        .page_of_posts(PostFilter::ByAuthor(author.id), pq.number())
        .await?;
    let (following, is_self) = match &user {
        Some(viewer) => (
            st.svc.is_following(viewer.id, author.id).await?,
            viewer.id == author.id,
        ),
        None => (false, false),
    };

    let mut ctx = base_ctx(&user);
    ctx.insert("author", &author);
    ctx.insert("page", &page);
    ctx.insert("following", &following);
    ctx.insert("is_self", &is_self);
    Ok(Html(render(&st.tera, "posts/profile.html", &ctx)?).into_response())
}

async fn post_detail<S: AppService>(
    State(st): State<AppState<S>>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let Some((entry, comments)) = st.svc.post_detail(id).await? else {
        return not_found(&st, &user);
    };

    let mut ctx = base_ctx(&user);
    ctx.insert("entry", &entry);
    ctx.insert("comments", &comments);
    Ok(Html(render(&st.tera, "posts/post_detail.html", &ctx)?).into_response())
}

async fn follow_index<S: AppService>(
    State(st): State<AppState<S>>,
    CurrentUser(me): CurrentUser,
    Query(pq): Query<PageQuery>,
) -> Result<Response, AppError> {
    let page = st
        .svc
        .page_of_posts(PostFilter::FeedOf(me.id), pq.number())
        .await?;
    let mut ctx = base_ctx(&Some(me));
    ctx.insert("page", &page);
    Ok(Html(render(&st.tera, "posts/follow.html", &ctx)?).into_response())
}

async fn profile_follow<S: AppService>(
    State(st): State<AppState<S>>,
    CurrentUser(me): CurrentUser,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let Some(author) = st.svc.user_by_username(&username).await? else {
        return not_found(&st, &Some(me));
    };
    st.svc.follow(me.id, author.id).await?;
    Ok(Redirect::to(&format!("/profile/{username}/")).into_response())
}

async fn profile_unfollow<S: AppService>(
    State(st): State<AppState<S>>,
    CurrentUser(me): CurrentUser,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let Some(author) = st.svc.user_by_username(&username).await? else {
        return not_found(&st, &Some(me));
    };
    st.svc.unfollow(me.id, author.id).await?;
    Ok(Redirect::to(&format!("/profile/{username}/")).into_response())
}

#[derive(Deserialize)]
struct CommentForm {
    text: String,
}

async fn add_comment<S: AppService>(
    State(st): State<AppState<S>>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i32>,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    if st.svc.post_by_id(id).await?.is_none() {
        return not_found(&st, &Some(me));
    }

    let text = form.text.trim();
    if !text.is_empty() {
        st.svc
            .add_comment(NewComment {
                post_id: id,
                author_id: me.id,
                text: text.to_string(),
            })
            .await?;
    }
    Ok(Redirect::to(&format!("/posts/{id}/")).into_response())
}

/// Fields of the post form, which arrives as multipart because of the
/// optional image upload.
struct PostFormData {
    text: String,
    group_id: Option<i32>,
    image: Option<(String, Vec<u8>)>,
}

async fn read_post_form(mut form: Multipart) -> Result<PostFormData, AppError> {
    let mut data = PostFormData {
        text: String::new(),
        group_id: None,
        image: None,
    };

    while let Some(field) = form.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => data.text = field.text().await?,
            "group" => {
                let raw = field.text().await?;
                if !raw.trim().is_empty() {
                    data.group_id = raw.trim().parse().ok();
                }
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    data.image = Some((file_name, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    Ok(data)
}

async fn render_post_form<S: AppService>(
    st: &AppState<S>,
    me: &User,
    is_edit: bool,
    post_id: i32,
    text: &str,
    group_id: Option<i32>,
    error: &str,
) -> Result<String, AppError> {
    let groups = st.svc.all_groups().await?;
    let mut ctx = base_ctx(&Some(me.clone()));
    ctx.insert("groups", &groups);
    ctx.insert("is_edit", &is_edit);
    ctx.insert("post_id", &post_id);
    ctx.insert("form_text", text);
    ctx.insert("form_group_id", &group_id.unwrap_or(0));
    ctx.insert("error", error);
    render(&st.tera, "posts/create_post.html", &ctx)
}

async fn post_create_form<S: AppService>(
    State(st): State<AppState<S>>,
    CurrentUser(me): CurrentUser,
) -> Result<Response, AppError> {
    let body = render_post_form(&st, &me, false, 0, "", None, "").await?;
    Ok(Html(body).into_response())
}

#[tracing::instrument(skip_all)]
async fn post_create<S: AppService>(
    State(st): State<AppState<S>>,
    CurrentUser(me): CurrentUser,
    form: Multipart,
) -> Result<Response, AppError> {
    let data = read_post_form(form).await?;

    if data.text.trim().is_empty() {
        let body =
            render_post_form(&st, &me, false, 0, &data.text, data.group_id, "Enter the post text")
                .await?;
        return Ok(Html(body).into_response());
    }

    let image = match &data.image {
        Some((name, bytes)) => Some(st.media.store_post_image(name, bytes).await?),
        None => None,
    };

    let created = st
        .svc
        .create_post(NewPost {
            author_id: me.id,
            group_id: data.group_id,
            text: data.text.trim().to_string(),
            image,
        })
        .await?;
    info!(post = created.id, author = %me.username, "post created");

    Ok(Redirect::to(&format!("/profile/{}/", me.username)).into_response())
}

async fn post_edit_form<S: AppService>(
    State(st): State<AppState<S>>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let Some(existing) = st.svc.post_by_id(id).await? else {
        return not_found(&st, &Some(me));
    };
    if existing.author_id != me.id {
        return Ok(Redirect::to(&format!("/posts/{id}/")).into_response());
    }

    let body =
        render_post_form(&st, &me, true, id, &existing.text, existing.group_id, "").await?;
    Ok(Html(body).into_response())
}

#[tracing::instrument(skip_all, fields(post = id))]
async fn post_edit<S: AppService>(
    State(st): State<AppState<S>>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i32>,
    form: Multipart,
) -> Result<Response, AppError> {
    let Some(existing) = st.svc.post_by_id(id).await? else {
        return not_found(&st, &Some(me));
    };
    if existing.author_id != me.id {
        return Ok(Redirect::to(&format!("/posts/{id}/")).into_response());
    }

    let data = read_post_form(form).await?;
    if data.text.trim().is_empty() {
        let body =
            render_post_form(&st, &me, true, id, &data.text, data.group_id, "Enter the post text")
                .await?;
        return Ok(Html(body).into_response());
    }

    // A fresh upload replaces the stored image, otherwise keep the old one.
    let image = match &data.image {
        Some((name, bytes)) => Some(st.media.store_post_image(name, bytes).await?),
        None => existing.image.clone(),
    };

    st.svc
        .update_post(
            id,
            PostChanges {
                text: data.text.trim().to_string(),
                group_id: data.group_id,
                image,
            },
        )
        .await?;

    Ok(Redirect::to(&format!("/posts/{id}/")).into_response())
}
