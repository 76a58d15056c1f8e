use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use super::group::Group;
use super::user::User;

#[derive(Serialize, Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub text: String,
    /// Media-relative path of the attached image, if any.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPost {
    pub author_id: i32,
    pub group_id: Option<i32>,
    pub text: String,
    pub image: Option<String>,
}

/// Changeset applied on edit. `None` clears the group; the caller carries
/// the previous image path forward when no new file was uploaded.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(treat_none_as_null = true)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<String>,
}

/// A post joined with its author and optional group, as the templates
/// consume it.
#[derive(Serialize, Debug, Clone)]
pub struct FeedEntry {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
}

impl From<(Post, User, Option<Group>)> for FeedEntry {
    fn from((post, author, group): (Post, User, Option<Group>)) -> Self {
        Self { post, author, group }
    }
}
