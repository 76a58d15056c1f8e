use std::sync::{Arc, Mutex};

use axum::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::models::comment::{Comment, CommentEntry, NewComment};
use crate::models::follow::Follow;
use crate::models::group::Group;
use crate::models::post::{FeedEntry, NewPost, Post, PostChanges};
use crate::models::session::Session;
use crate::models::user::{NewUser, User};
use crate::pagination::{paginate_slice, Page, POSTS_PER_PAGE};
use crate::services::{
    FollowService, GroupService, PostFilter, PostService, SessionService, UserService,
};

#[derive(Default)]
struct Store {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
    sessions: Vec<Session>,
    next_id: i32,
}

impl Store {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

fn entry_for(s: &Store, post: &Post) -> FeedEntry {
    FeedEntry {
        post: post.clone(),
        author: s
            .users
            .iter()
            .find(|u| u.id == post.author_id)
            .cloned()
            .expect("post author seeded"),
        group: post
            .group_id
            .and_then(|gid| s.groups.iter().find(|g| g.id == gid).cloned()),
    }
}

/// In-memory stand-in for the database service, shared across clones so
/// tests can seed and inspect state next to the router under test.
#[derive(Clone, Default)]
pub struct MockService {
    store: Arc<Mutex<Store>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        f(&mut self.store.lock().expect("mock store poisoned"))
    }

    /// Seed a user whose password is never checked; the stored hash is
    /// deliberately unparseable.
    pub fn seed_user(&self, username: &str) -> User {
        self.seed_user_hashed(username, "!".to_string())
    }

    /// Seed a user with a real argon2 hash for login-flow tests.
    pub fn seed_user_with_password(&self, username: &str, password: &str) -> User {
        self.seed_user_hashed(username, User::hash_password(password))
    }

    fn seed_user_hashed(&self, username: &str, password_hash: String) -> User {
        self.with(|s| {
            let user = User {
                id: s.next_id(),
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash,
                created_at: Utc::now(),
            };
            s.users.push(user.clone());
            user
        })
    }

    pub fn seed_group(&self, title: &str, slug: &str) -> Group {
        self.with(|s| {
            let group = Group {
                id: s.next_id(),
                title: title.to_string(),
                slug: slug.to_string(),
                description: format!("All about {title}"),
            };
            s.groups.push(group.clone());
            group
        })
    }

    pub fn seed_post(&self, author: &User, group: Option<&Group>, text: &str) -> Post {
        self.with(|s| {
            let post = Post {
                id: s.next_id(),
                author_id: author.id,
                group_id: group.map(|g| g.id),
                text: text.to_string(),
                image: None,
                created_at: Utc::now(),
            };
            s.posts.push(post.clone());
            post
        })
    }

    pub fn seed_follow(&self, user: &User, author: &User) {
        self.with(|s| {
            let id = s.next_id();
            s.follows.push(Follow {
                id,
                user_id: user.id,
                author_id: author.id,
                created_at: Utc::now(),
            });
        });
    }

    pub fn seed_session(&self, user: &User) -> Uuid {
        self.with(|s| {
            let session = Session {
                id: Uuid::now_v7(),
                user_id: user.id,
                created_at: Utc::now(),
                expires_at: Utc::now() + Duration::hours(1),
            };
            let id = session.id;
            s.sessions.push(session);
            id
        })
    }

    pub fn post_count(&self) -> usize {
        self.with(|s| s.posts.len())
    }

    pub fn comment_count(&self) -> usize {
        self.with(|s| s.comments.len())
    }

    pub fn follow_count(&self) -> usize {
        self.with(|s| s.follows.len())
    }

    pub fn session_count(&self) -> usize {
        self.with(|s| s.sessions.len())
    }

    pub fn has_follow(&self, user_id: i32, author_id: i32) -> bool {
        self.with(|s| {
            s.follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == author_id)
        })
    }

    pub fn latest_post(&self) -> Option<Post> {
        self.with(|s| s.posts.last().cloned())
    }

    pub fn post_text(&self, id: i32) -> Option<String> {
        self.with(|s| s.posts.iter().find(|p| p.id == id).map(|p| p.text.clone()))
    }

    pub fn user_by_name(&self, username: &str) -> Option<User> {
        self.with(|s| s.users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl UserService<anyhow::Error> for MockService {
    async fn create_user(&self, user: NewUser) -> anyhow::Result<User> {
        Ok(self.with(|s| {
            let created = User {
                id: s.next_id(),
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                created_at: Utc::now(),
            };
            s.users.push(created.clone());
            created
        }))
    }

    async fn user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self.user_by_name(username))
    }

    async fn user_by_id(&self, id: i32) -> anyhow::Result<Option<User>> {
        Ok(self.with(|s| s.users.iter().find(|u| u.id == id).cloned()))
    }

    async fn update_password(&self, id: i32, password_hash: String) -> anyhow::Result<()> {
        self.with(|s| {
            if let Some(user) = s.users.iter_mut().find(|u| u.id == id) {
                user.password_hash = password_hash;
            }
        });
        Ok(())
    }
}

#[async_trait]
impl SessionService<anyhow::Error> for MockService {
    async fn create_session(&self, user_id: i32, ttl: Duration) -> anyhow::Result<Session> {
        Ok(self.with(|s| {
            let session = Session {
                id: Uuid::now_v7(),
                user_id,
                created_at: Utc::now(),
                expires_at: Utc::now() + ttl,
            };
            s.sessions.push(session.clone());
            session
        }))
    }

    async fn session_user(&self, session_id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.with(|s| {
            s.sessions
                .iter()
                .find(|x| x.id == session_id && x.is_valid())
                .and_then(|x| s.users.iter().find(|u| u.id == x.user_id).cloned())
        }))
    }

    async fn delete_session(&self, session_id: Uuid) -> anyhow::Result<()> {
        self.with(|s| s.sessions.retain(|x| x.id != session_id));
        Ok(())
    }
}

#[async_trait]
impl PostService<anyhow::Error> for MockService {
    async fn page_of_posts(
        &self,
        filter: PostFilter,
        requested: i64,
    ) -> anyhow::Result<Page<FeedEntry>> {
        Ok(self.with(|s| {
            let mut matching: Vec<&Post> = s
                .posts
                .iter()
                .filter(|p| match filter {
                    PostFilter::All => true,
                    PostFilter::InGroup(gid) => p.group_id == Some(gid),
                    PostFilter::ByAuthor(aid) => p.author_id == aid,
                    PostFilter::FeedOf(uid) => s
                        .follows
                        .iter()
                        .any(|f| f.user_id == uid && f.author_id == p.author_id),
                })
                .collect();
            matching.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            });
            let entries: Vec<FeedEntry> =
                matching.into_iter().map(|p| entry_for(s, p)).collect();
            paginate_slice(&entries, requested, POSTS_PER_PAGE)
        }))
    }

    async fn post_detail(
        &self,
        id: i32,
    ) -> anyhow::Result<Option<(FeedEntry, Vec<CommentEntry>)>> {
        Ok(self.with(|s| {
            let post = s.posts.iter().find(|p| p.id == id)?;
            let mut comments: Vec<&Comment> =
                s.comments.iter().filter(|c| c.post_id == id).collect();
            comments.sort_by_key(|c| (c.created_at, c.id));
            let entries = comments
                .into_iter()
                .map(|c| CommentEntry {
                    comment: c.clone(),
                    author: s
                        .users
                        .iter()
                        .find(|u| u.id == c.author_id)
                        .cloned()
                        .expect("comment author seeded"),
                })
                .collect();
            Some((entry_for(s, post), entries))
        }))
    }

    async fn post_by_id(&self, id: i32) -> anyhow::Result<Option<Post>> {
        Ok(self.with(|s| s.posts.iter().find(|p| p.id == id).cloned()))
    }

    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post> {
        Ok(self.with(|s| {
            let created = Post {
                id: s.next_id(),
                author_id: post.author_id,
                group_id: post.group_id,
                text: post.text,
                image: post.image,
                created_at: Utc::now(),
            };
            s.posts.push(created.clone());
            created
        }))
    }

    async fn update_post(&self, id: i32, changes: PostChanges) -> anyhow::Result<Post> {
        self.with(|s| {
            let post = s
                .posts
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| anyhow::anyhow!("no post {id}"))?;
            post.text = changes.text;
            post.group_id = changes.group_id;
            post.image = changes.image;
            Ok(post.clone())
        })
    }

    async fn add_comment(&self, comment: NewComment) -> anyhow::Result<Comment> {
        Ok(self.with(|s| {
            let created = Comment {
                id: s.next_id(),
                post_id: comment.post_id,
                author_id: comment.author_id,
                text: comment.text,
                created_at: Utc::now(),
            };
            s.comments.push(created.clone());
            created
        }))
    }
}

#[async_trait]
impl GroupService<anyhow::Error> for MockService {
    async fn group_by_slug(&self, slug: &str) -> anyhow::Result<Option<Group>> {
        Ok(self.with(|s| s.groups.iter().find(|g| g.slug == slug).cloned()))
    }

    async fn all_groups(&self) -> anyhow::Result<Vec<Group>> {
        Ok(self.with(|s| {
            let mut groups = s.groups.clone();
            groups.sort_by(|a, b| a.title.cmp(&b.title));
            groups
        }))
    }
}

#[async_trait]
impl FollowService<anyhow::Error> for MockService {
    async fn follow(&self, user_id: i32, author_id: i32) -> anyhow::Result<()> {
        if user_id == author_id {
            return Ok(());
        }
        self.with(|s| {
            if !s
                .follows
                .iter()
                .any(|f| f.user_id == user_id && f.author_id == author_id)
            {
                let id = s.next_id();
                s.follows.push(Follow {
                    id,
                    user_id,
                    author_id,
                    created_at: Utc::now(),
                });
            }
        });
        Ok(())
    }

    async fn unfollow(&self, user_id: i32, author_id: i32) -> anyhow::Result<()> {
        self.with(|s| {
            s.follows
                .retain(|f| !(f.user_id == user_id && f.author_id == author_id))
        });
        Ok(())
    }

    async fn is_following(&self, user_id: i32, author_id: i32) -> anyhow::Result<bool> {
        Ok(self.has_follow(user_id, author_id))
    }
}
