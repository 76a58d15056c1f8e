use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Directed subscription edge: `user_id` follows `author_id`. Unique per
/// pair; self-edges are rejected before they reach the database.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::follows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Follow {
    pub id: i32,
    pub user_id: i32,
    pub author_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::follows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewFollow {
    pub user_id: i32,
    pub author_id: i32,
}
