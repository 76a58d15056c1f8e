use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use super::user::User;

#[derive(Serialize, Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewComment {
    pub post_id: i32,
    pub author_id: i32,
    pub text: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct CommentEntry {
    pub comment: Comment,
    pub author: User,
}

impl From<(Comment, User)> for CommentEntry {
    fn from((comment, author): (Comment, User)) -> Self {
        Self { comment, author }
    }
}
