use axum::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::models::follow::NewFollow;
use crate::schema;

use super::AppServiceDb;

#[async_trait]
pub trait FollowService<E = anyhow::Error> {
    /// Subscribe `user_id` to `author_id`. Already-existing edges and
    /// self-edges are silently ignored.
    async fn follow(&self, user_id: i32, author_id: i32) -> Result<(), E>;
    async fn unfollow(&self, user_id: i32, author_id: i32) -> Result<(), E>;
    async fn is_following(&self, user_id: i32, author_id: i32) -> Result<bool, E>;
}

#[async_trait]
impl FollowService<anyhow::Error> for AppServiceDb {
    async fn follow(&self, uid: i32, aid: i32) -> anyhow::Result<()> {
        use schema::follows::dsl::*;

        // The table carries a CHECK against self-edges; bail out here so
        // the constraint never turns a routine click into an error.
        if uid == aid {
            return Ok(());
        }

        let mut conn = self.pool().get().await?;
        diesel::insert_into(follows)
            .values(&NewFollow {
                user_id: uid,
                author_id: aid,
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn unfollow(&self, uid: i32, aid: i32) -> anyhow::Result<()> {
        use schema::follows::dsl::*;

        let mut conn = self.pool().get().await?;
        diesel::delete(follows.filter(user_id.eq(uid)).filter(author_id.eq(aid)))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn is_following(&self, uid: i32, aid: i32) -> anyhow::Result<bool> {
        use schema::follows::dsl::*;

        let mut conn = self.pool().get().await?;
        let found = diesel::select(diesel::dsl::exists(
            follows.filter(user_id.eq(uid)).filter(author_id.eq(aid)),
        ))
        .get_result(&mut conn)
        .await?;
        Ok(found)
    }
}
