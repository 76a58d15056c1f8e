use diesel::prelude::*;
use serde::Serialize;

/// A topical category posts can be attached to. Groups are reference data
/// managed outside the request flow; the web layer only reads them.
#[derive(Serialize, Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Group {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
}
