pub mod follows;
pub mod posts;
pub mod users;

use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::AsyncPgConnection;

pub use follows::FollowService;
pub use posts::{GroupService, PostFilter, PostService};
pub use users::{SessionService, UserService};

pub type DbPool = Pool<AsyncPgConnection>;

/// Everything the routers need from the backing store. The database
/// implementation is [`AppServiceDb`]; the tests plug in an in-memory one.
pub trait AppService:
    UserService + SessionService + GroupService + PostService + FollowService
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AppService for T where
    T: UserService
        + SessionService
        + GroupService
        + PostService
        + FollowService
        + Clone
        + Send
        + Sync
        + 'static
{
}

#[derive(Clone)]
pub struct AppServiceDb {
    pool: DbPool,
}

impl AppServiceDb {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}
