use axum::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::models::comment::{Comment, CommentEntry, NewComment};
use crate::models::group::Group;
use crate::models::post::{FeedEntry, NewPost, Post, PostChanges};
use crate::models::user::User;
use crate::pagination::{clamp_page, num_pages, Page, POSTS_PER_PAGE};
use crate::schema;

use super::AppServiceDb;

/// Which slice of the post stream a feed shows. Every listing page in the
/// application is one of these over the same newest-first ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    InGroup(i32),
    ByAuthor(i32),
    /// Posts authored by accounts the given user follows.
    FeedOf(i32),
}

#[async_trait]
pub trait PostService<E = anyhow::Error> {
    async fn page_of_posts(&self, filter: PostFilter, requested: i64)
        -> Result<Page<FeedEntry>, E>;
    async fn post_detail(&self, id: i32) -> Result<Option<(FeedEntry, Vec<CommentEntry>)>, E>;
    async fn post_by_id(&self, id: i32) -> Result<Option<Post>, E>;
    async fn create_post(&self, post: NewPost) -> Result<Post, E>;
    async fn update_post(&self, id: i32, changes: PostChanges) -> Result<Post, E>;
    async fn add_comment(&self, comment: NewComment) -> Result<Comment, E>;
}

#[async_trait]
pub trait GroupService<E = anyhow::Error> {
    async fn group_by_slug(&self, slug: &str) -> Result<Option<Group>, E>;
    async fn all_groups(&self) -> Result<Vec<Group>, E>;
}

#[async_trait]
impl PostService<anyhow::Error> for AppServiceDb {
    async fn page_of_posts(
        &self,
        filter: PostFilter,
        requested: i64,
    ) -> anyhow::Result<Page<FeedEntry>> {
        use schema::{follows, groups, posts, users};

        let mut conn = self.pool().get().await?;

        // Count and slice run the same filter; the page number is clamped
        // between them so an out-of-range request lands on a real page.
        macro_rules! feed_page {
            ($base:expr) => {{
                let total: i64 = $base.count().get_result(&mut conn).await?;
                let pages = num_pages(total, POSTS_PER_PAGE);
                let number = clamp_page(requested, pages);
                let rows: Vec<(Post, User, Option<Group>)> = $base
                    .inner_join(users::table)
                    .left_join(groups::table)
                    .order((posts::created_at.desc(), posts::id.desc()))
                    .offset((number - 1) * POSTS_PER_PAGE)
                    .limit(POSTS_PER_PAGE)
                    .select((
                        Post::as_select(),
                        User::as_select(),
                        Option::<Group>::as_select(),
                    ))
                    .load(&mut conn)
                    .await?;
                Page::new(
                    rows.into_iter().map(FeedEntry::from).collect(),
                    number,
                    pages,
                    total,
                )
            }};
        }

        let page = match filter {
            PostFilter::All => feed_page!(posts::table),
            PostFilter::InGroup(gid) => {
                feed_page!(posts::table.filter(posts::group_id.eq(gid)))
            }
            PostFilter::ByAuthor(aid) => {
                feed_page!(posts::table.filter(posts::author_id.eq(aid)))
            }
            PostFilter::FeedOf(uid) => {
                feed_page!(posts::table.filter(posts::author_id.eq_any(
                    follows::table
                        .filter(follows::user_id.eq(uid))
                        .select(follows::author_id)
                )))
            }
        };

        Ok(page)
    }

    async fn post_detail(
        &self,
        id: i32,
    ) -> anyhow::Result<Option<(FeedEntry, Vec<CommentEntry>)>> {
        use schema::{comments, groups, posts, users};

        let mut conn = self.pool().get().await?;

        let row: Option<(Post, User, Option<Group>)> = posts::table
            .find(id)
            .inner_join(users::table)
            .left_join(groups::table)
            .select((
                Post::as_select(),
                User::as_select(),
                Option::<Group>::as_select(),
            ))
            .first(&mut conn)
            .await
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        let comments: Vec<(Comment, User)> = comments::table
            .filter(comments::post_id.eq(id))
            .inner_join(users::table)
            .order(comments::created_at.asc())
            .select((Comment::as_select(), User::as_select()))
            .load(&mut conn)
            .await?;

        Ok(Some((
            row.into(),
            comments.into_iter().map(CommentEntry::from).collect(),
        )))
    }

    async fn post_by_id(&self, post_id: i32) -> anyhow::Result<Option<Post>> {
        use schema::posts::dsl::*;

        let mut conn = self.pool().get().await?;
        let post = posts
            .find(post_id)
            .select(Post::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(post)
    }

    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post> {
        use schema::posts::dsl::*;

        let mut conn = self.pool().get().await?;
        let created = diesel::insert_into(posts)
            .values(&post)
            .returning(Post::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(created)
    }

    async fn update_post(&self, post_id: i32, changes: PostChanges) -> anyhow::Result<Post> {
        use schema::posts::dsl::*;

        let mut conn = self.pool().get().await?;
        let updated = diesel::update(posts.find(post_id))
            .set(&changes)
            .returning(Post::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(updated)
    }

    async fn add_comment(&self, comment: NewComment) -> anyhow::Result<Comment> {
        use schema::comments::dsl::*;

        let mut conn = self.pool().get().await?;
        let created = diesel::insert_into(comments)
            .values(&comment)
            .returning(Comment::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(created)
    }
}

#[async_trait]
impl GroupService<anyhow::Error> for AppServiceDb {
    async fn group_by_slug(&self, group_slug: &str) -> anyhow::Result<Option<Group>> {
        use schema::groups::dsl::*;

        let mut conn = self.pool().get().await?;
        let group = groups
            .filter(slug.eq(group_slug))
            .select(Group::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(group)
    }

    async fn all_groups(&self) -> anyhow::Result<Vec<Group>> {
        use schema::groups::dsl::*;

        let mut conn = self.pool().get().await?;
        let gs = groups
            .order(title.asc())
            .select(Group::as_select())
            .load(&mut conn)
            .await?;
        Ok(gs)
    }
}
