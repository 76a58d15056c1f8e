use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

struct CachedPage {
    rendered_at: Instant,
    body: String,
}

/// Whole-page response cache keyed by request URI. Entries older than the
/// TTL are treated as absent and overwritten on the next render.
#[derive(Clone)]
pub struct PageCache {
    pages: Arc<DashMap<String, CachedPage>>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pages: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.pages.get(key)?;
        if entry.rendered_at.elapsed() < self.ttl {
            Some(entry.body.clone())
        } else {
            drop(entry);
            self.pages.remove(key);
            None
        }
    }

    pub fn put(&self, key: String, body: String) {
        self.pages.insert(
            key,
            CachedPage {
                rendered_at: Instant::now(),
                body,
            },
        );
    }
}
