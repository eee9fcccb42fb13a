//! Dashboard statistics cache, invalidated by lifecycle events.

use std::time::Duration;

use moka::future::Cache;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::lifecycle::LifecycleEvent;
use crate::stats_service::Stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsKey {
    Admin,
    Customer(Uuid),
    Professional(Uuid),
}

#[derive(Clone)]
pub struct StatsCache {
    inner: Cache<StatsKey, Stats>,
}

impl StatsCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let inner = Cache::builder().max_capacity(max_capacity).time_to_live(ttl).build();
        Self { inner }
    }

    pub fn from_config(cfg: &configs::CacheConfig) -> Self {
        Self::new(Duration::from_secs(cfg.ttl_secs), cfg.max_capacity)
    }

    pub async fn get(&self, key: &StatsKey) -> Option<Stats> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: StatsKey, value: Stats) {
        self.inner.insert(key, value).await;
    }

    /// Drop every key an event could have changed.
    pub async fn invalidate_for(&self, event: &LifecycleEvent) {
        self.inner.invalidate(&StatsKey::Admin).await;
        self.inner.invalidate(&StatsKey::Customer(event.customer_id)).await;
        for p in &event.professionals {
            self.inner.invalidate(&StatsKey::Professional(*p)).await;
        }
    }

    /// Catalog and account changes only move the admin dashboard counts.
    pub async fn invalidate_admin(&self) {
        self.inner.invalidate(&StatsKey::Admin).await;
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

/// Keep `cache` in step with committed transitions until the sender side
/// of `rx` is gone.
pub fn spawn_invalidation(cache: StatsCache, mut rx: broadcast::Receiver<LifecycleEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    debug!(request_id = %event.request_id, to = %event.to, "invalidating stats");
                    cache.invalidate_for(&event).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "stats invalidation lagged, clearing cache");
                    cache.invalidate_all();
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
