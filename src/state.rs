use std::sync::Arc;

use tera::Tera;

use crate::cache::PageCache;
use crate::media::MediaStore;

/// Shared state behind every router, generic over the backing service so
/// tests can swap the database out.
pub struct AppState<S> {
    pub svc: S,
    pub tera: Arc<Tera>,
    pub cache: PageCache,
    pub media: MediaStore,
    pub session_ttl: chrono::Duration,
}

impl<S: Clone> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            svc: self.svc.clone(),
            tera: self.tera.clone(),
            cache: self.cache.clone(),
            media: self.media.clone(),
            session_ttl: self.session_ttl,
        }
    }
}

pub fn load_templates() -> tera::Result<Tera> {
    Tera::new("src/templates/**/*.html")
}
