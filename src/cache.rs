use std::time::{Duration, Instant};
use tokio::sync::RwLock;

// Cache entry with timestamp
#[derive(Debug, Clone, Copy)]
pub struct CacheEntry {
    pub count: u64,
    pub created_at: Instant,
}

// Last known waitlist size, served until it is `ttl` old
pub struct CountCache {
    entry: RwLock<Option<CacheEntry>>,
    ttl: Duration,
}

impl CountCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
        }
    }

    pub async fn get(&self) -> Option<u64> {
        self.get_at(Instant::now()).await
    }

    pub async fn get_at(&self, now: Instant) -> Option<u64> {
        let entry = (*self.entry.read().await)?;
        (now.saturating_duration_since(entry.created_at) < self.ttl).then_some(entry.count)
    }

    pub async fn put(&self, count: u64) {
        self.put_at(count, Instant::now()).await;
    }

    pub async fn put_at(&self, count: u64, now: Instant) {
        *self.entry.write().await = Some(CacheEntry {
            count,
            created_at: now,
        });
    }
}
