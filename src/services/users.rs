use axum::async_trait;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::models::session::{NewSession, Session};
use crate::models::user::{NewUser, User};
use crate::schema;

use super::AppServiceDb;

#[async_trait]
pub trait UserService<E = anyhow::Error> {
    async fn create_user(&self, user: NewUser) -> Result<User, E>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, E>;
    async fn user_by_id(&self, id: i32) -> Result<Option<User>, E>;
    async fn update_password(&self, id: i32, password_hash: String) -> Result<(), E>;
}

#[async_trait]
pub trait SessionService<E = anyhow::Error> {
    async fn create_session(&self, user_id: i32, ttl: Duration) -> Result<Session, E>;
    /// The user behind a session id, if the session exists and has not
    /// expired.
    async fn session_user(&self, session_id: Uuid) -> Result<Option<User>, E>;
    async fn delete_session(&self, session_id: Uuid) -> Result<(), E>;
}

#[async_trait]
impl UserService<anyhow::Error> for AppServiceDb {
    async fn create_user(&self, user: NewUser) -> anyhow::Result<User> {
        use schema::users::dsl::*;

        let mut conn = self.pool().get().await?;
        let created = diesel::insert_into(users)
            .values(&user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(created)
    }

    async fn user_by_username(&self, name: &str) -> anyhow::Result<Option<User>> {
        use schema::users::dsl::*;

        let mut conn = self.pool().get().await?;
        let user = users
            .filter(username.eq(name))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(user)
    }

    async fn user_by_id(&self, user_id: i32) -> anyhow::Result<Option<User>> {
        use schema::users::dsl::*;

        let mut conn = self.pool().get().await?;
        let user = users
            .find(user_id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(user)
    }

    async fn update_password(&self, user_id: i32, hash: String) -> anyhow::Result<()> {
        use schema::users::dsl::*;

        let mut conn = self.pool().get().await?;
        diesel::update(users.find(user_id))
            .set(password_hash.eq(hash))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionService<anyhow::Error> for AppServiceDb {
    async fn create_session(&self, uid: i32, ttl: Duration) -> anyhow::Result<Session> {
        use schema::sessions::dsl::*;

        let mut conn = self.pool().get().await?;
        let session = diesel::insert_into(sessions)
            .values(&NewSession {
                id: Uuid::now_v7(),
                user_id: uid,
                expires_at: Utc::now() + ttl,
            })
            .returning(Session::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(session)
    }

    async fn session_user(&self, session_id: Uuid) -> anyhow::Result<Option<User>> {
        let mut conn = self.pool().get().await?;
        let user = schema::sessions::table
            .find(session_id)
            .inner_join(schema::users::table)
            .filter(schema::sessions::expires_at.gt(Utc::now()))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(user)
    }

    async fn delete_session(&self, session_id: Uuid) -> anyhow::Result<()> {
        use schema::sessions::dsl::*;

        let mut conn = self.pool().get().await?;
        diesel::delete(sessions.find(session_id))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}
