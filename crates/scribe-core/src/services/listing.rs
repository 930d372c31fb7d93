//! Listing cache - time-boxed, recency-sorted snapshots of post listings.
//!
//! One slot per filter signature. A slot is EMPTY until its first fetch,
//! FRESH while younger than the TTL and STALE afterwards; invalidation sends it
//! back to EMPTY. Every stored snapshot is mirrored into a durable [`Cache`] so
//! a restarted client can show the last known listing before any network call.
//!
//! Fetches are ticketed: a response is only stored when its ticket is newer
//! than both the slot's current snapshot and the slot's last invalidation.
//! Durable writes happen outside the slot lock and are serialized among
//! themselves; a write is skipped once its ticket is no longer the slot's.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::domain::{Post, PostFilter, sort_by_recency};
use crate::error::RepoError;
use crate::ports::{Cache, Clock, PostRepository};

/// Durable key of the default (active posts) listing.
pub const DEFAULT_LISTING_KEY: &str = "blogPosts";

/// How long a listing is served without asking the backend.
pub const DEFAULT_LISTING_TTL: Duration = Duration::from_secs(5 * 60);

/// Snapshot of one listing, sorted newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedListing {
    pub posts: Vec<Post>,
    pub fetched_at: DateTime<Utc>,
}

impl CachedListing {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        // A snapshot stamped in the future (clock skew) counts as fresh.
        (now - self.fetched_at)
            .to_std()
            .map(|age| age < ttl)
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Fresh,
    Stale,
}

#[derive(Debug, Default)]
struct Slot {
    listing: Option<CachedListing>,
    ticket: u64,
    invalidated_at: u64,
    revalidating: bool,
}

pub struct ListingCache {
    repo: Arc<dyn PostRepository>,
    store: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slots: RwLock<HashMap<String, Slot>>,
    tickets: AtomicU64,
    durable: Mutex<()>,
}

impl ListingCache {
    pub fn new(
        repo: Arc<dyn PostRepository>,
        store: Arc<dyn Cache>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            repo,
            store,
            clock,
            ttl,
            slots: RwLock::new(HashMap::new()),
            tickets: AtomicU64::new(0),
            durable: Mutex::new(()),
        }
    }

    /// Durable storage key for a filter.
    pub fn storage_key(filter: &PostFilter) -> String {
        Self::key_for_signature(&filter.signature())
    }

    fn key_for_signature(signature: &str) -> String {
        if signature == PostFilter::default().signature() {
            DEFAULT_LISTING_KEY.to_string()
        } else {
            format!("{DEFAULT_LISTING_KEY}:{signature}")
        }
    }

    pub async fn state(&self, filter: &PostFilter) -> SlotState {
        let slots = self.slots.read().await;
        match slots.get(&filter.signature()).and_then(|s| s.listing.as_ref()) {
            None => SlotState::Empty,
            Some(l) if l.is_fresh(self.clock.now(), self.ttl) => SlotState::Fresh,
            Some(_) => SlotState::Stale,
        }
    }

    /// Current snapshot regardless of age. Never touches the network.
    pub async fn peek(&self, filter: &PostFilter) -> Option<CachedListing> {
        let slots = self.slots.read().await;
        slots
            .get(&filter.signature())
            .and_then(|s| s.listing.clone())
    }

    /// Serve the listing: from memory while fresh, otherwise refetch.
    ///
    /// A failed refetch falls back to the last snapshot (even stale), then to
    /// an empty list.
    pub async fn get(&self, filter: &PostFilter) -> Vec<Post> {
        if self.peek(filter).await.is_none() {
            self.hydrate(filter).await;
        }
        if let Some(listing) = self.peek(filter).await {
            if listing.is_fresh(self.clock.now(), self.ttl) {
                tracing::debug!(filter = %filter.signature(), "Listing served from cache");
                return listing.posts;
            }
        }

        match self.refresh(filter).await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!(
                    filter = %filter.signature(),
                    error = %e,
                    "Listing refresh failed, serving last snapshot"
                );
                self.peek(filter)
                    .await
                    .map(|l| l.posts)
                    .unwrap_or_default()
            }
        }
    }

    /// Return whatever snapshot exists right away and refresh stale ones in
    /// the background. Falls back to [`ListingCache::get`] when nothing is cached.
    pub async fn get_stale_while_revalidate(self: &Arc<Self>, filter: &PostFilter) -> Vec<Post> {
        if self.peek(filter).await.is_none() {
            self.hydrate(filter).await;
        }
        let Some(listing) = self.peek(filter).await else {
            return self.get(filter).await;
        };
        if listing.is_fresh(self.clock.now(), self.ttl) {
            return listing.posts;
        }

        if self.begin_revalidation(filter).await {
            let cache = Arc::clone(self);
            let filter = filter.clone();
            tokio::spawn(async move {
                if let Err(e) = cache.refresh(&filter).await {
                    tracing::warn!(
                        filter = %filter.signature(),
                        error = %e,
                        "Background listing refresh failed"
                    );
                }
                cache.end_revalidation(&filter).await;
            });
        }
        listing.posts
    }

    /// Unconditional fetch. The sorted result is returned even when a newer
    /// fetch or an invalidation prevents it from being stored.
    pub async fn refresh(&self, filter: &PostFilter) -> Result<Vec<Post>, RepoError> {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let started_at = self.clock.now();

        let mut posts = self.repo.list(filter).await?;
        sort_by_recency(&mut posts);

        let listing = CachedListing {
            posts: posts.clone(),
            fetched_at: started_at,
        };
        let key = filter.signature();
        let stored = {
            let mut slots = self.slots.write().await;
            let slot = slots.entry(key.clone()).or_default();
            if ticket > slot.ticket && ticket > slot.invalidated_at {
                slot.listing = Some(listing.clone());
                slot.ticket = ticket;
                true
            } else {
                false
            }
        };

        if stored {
            tracing::debug!(filter = %key, count = posts.len(), ticket, "Listing stored");
            self.persist(filter, &listing, ticket).await;
        } else {
            tracing::debug!(filter = %key, ticket, "Discarding superseded listing");
        }
        Ok(posts)
    }

    /// Load the durable snapshot into an empty slot. Returns whether one was loaded.
    pub async fn hydrate(&self, filter: &PostFilter) -> bool {
        let key = Self::storage_key(filter);
        let Some(raw) = self.store.get(&key).await else {
            return false;
        };
        let mut listing = match serde_json::from_str::<CachedListing>(&raw) {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Dropping unreadable listing snapshot");
                if let Err(e) = self.store.delete(&key).await {
                    tracing::warn!(key = %key, error = %e, "Failed to drop listing snapshot");
                }
                return false;
            }
        };
        sort_by_recency(&mut listing.posts);

        let mut slots = self.slots.write().await;
        let slot = slots.entry(filter.signature()).or_default();
        if slot.listing.is_some() {
            return false;
        }
        tracing::debug!(key = %key, count = listing.posts.len(), "Listing hydrated from storage");
        slot.listing = Some(listing);
        true
    }

    /// Force the next read of this listing to hit the backend.
    pub async fn invalidate(&self, filter: &PostFilter) {
        let issued = self.tickets.load(Ordering::SeqCst);
        {
            let mut slots = self.slots.write().await;
            let slot = slots.entry(filter.signature()).or_default();
            slot.listing = None;
            slot.invalidated_at = issued;
        }
        self.forget(&Self::storage_key(filter)).await;
    }

    /// Invalidate every listing this cache has seen, plus the default one.
    pub async fn invalidate_all(&self) {
        let issued = self.tickets.load(Ordering::SeqCst);
        let mut keys = vec![DEFAULT_LISTING_KEY.to_string()];
        {
            let mut slots = self.slots.write().await;
            for (signature, slot) in slots.iter_mut() {
                slot.listing = None;
                slot.invalidated_at = issued;
                let key = Self::key_for_signature(signature);
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        for key in keys {
            self.forget(&key).await;
        }
    }

    async fn persist(&self, filter: &PostFilter, listing: &CachedListing, ticket: u64) {
        let key = Self::storage_key(filter);
        let raw = match serde_json::to_string(listing) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to encode listing snapshot");
                return;
            }
        };

        let _durable = self.durable.lock().await;
        let current = {
            let slots = self.slots.read().await;
            slots
                .get(&filter.signature())
                .is_some_and(|s| s.ticket == ticket && s.listing.is_some())
        };
        if !current {
            tracing::debug!(key = %key, ticket, "Skipping superseded snapshot write");
            return;
        }
        if let Err(e) = self.store.set(&key, &raw, None).await {
            tracing::warn!(key = %key, error = %e, "Failed to persist listing snapshot");
        }
    }

    async fn forget(&self, key: &str) {
        let _durable = self.durable.lock().await;
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete listing snapshot");
        }
    }

    async fn begin_revalidation(&self, filter: &PostFilter) -> bool {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(filter.signature()).or_default();
        !std::mem::replace(&mut slot.revalidating, true)
    }

    async fn end_revalidation(&self, filter: &PostFilter) {
        let mut slots = self.slots.write().await;
        if let Some(slot) = slots.get_mut(&filter.signature()) {
            slot.revalidating = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ManualClock;
    use crate::services::testing::{MapCache, ScriptedListRepo, at, post};

    fn cache_with(
        repo: Arc<ScriptedListRepo>,
        store: Arc<MapCache>,
    ) -> (Arc<ListingCache>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(at(0)));
        let cache = Arc::new(ListingCache::new(
            repo,
            store,
            clock.clone(),
            DEFAULT_LISTING_TTL,
        ));
        (cache, clock)
    }

    fn slugs(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.slug.as_str()).collect()
    }

    #[tokio::test]
    async fn test_get_within_ttl_lists_once() {
        let repo = Arc::new(ScriptedListRepo::new(vec![Ok(vec![post("a", 1)])]));
        let (cache, clock) = cache_with(repo.clone(), Arc::default());
        let filter = PostFilter::default();

        assert_eq!(cache.state(&filter).await, SlotState::Empty);
        cache.get(&filter).await;
        clock.advance(chrono::Duration::minutes(4));
        let second = cache.get(&filter).await;

        assert_eq!(repo.calls(), 1);
        assert_eq!(slugs(&second), ["a"]);
        assert_eq!(cache.state(&filter).await, SlotState::Fresh);
    }

    #[tokio::test]
    async fn test_get_sorts_out_of_order_responses() {
        let repo = Arc::new(ScriptedListRepo::new(vec![
            Ok(vec![post("b", 2), post("a", 1), post("c", 3)]),
            Ok(vec![post("d", 4), post("f", 6), post("e", 5)]),
        ]));
        let (cache, clock) = cache_with(repo.clone(), Arc::default());
        let filter = PostFilter::default();

        assert_eq!(slugs(&cache.get(&filter).await), ["c", "b", "a"]);
        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(cache.state(&filter).await, SlotState::Stale);
        assert_eq!(slugs(&cache.get(&filter).await), ["f", "e", "d"]);
        assert_eq!(repo.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_fetch() {
        let repo = Arc::new(ScriptedListRepo::new(vec![
            Ok(vec![post("a", 1)]),
            Ok(vec![post("a", 1), post("b", 2)]),
        ]));
        let store = Arc::new(MapCache::default());
        let (cache, _clock) = cache_with(repo.clone(), store.clone());
        let filter = PostFilter::default();

        cache.get(&filter).await;
        assert!(store.entries.lock().unwrap().contains_key(DEFAULT_LISTING_KEY));

        cache.invalidate(&filter).await;
        assert_eq!(cache.state(&filter).await, SlotState::Empty);
        assert!(!store.entries.lock().unwrap().contains_key(DEFAULT_LISTING_KEY));

        assert_eq!(slugs(&cache.get(&filter).await), ["b", "a"]);
        assert_eq!(repo.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_snapshot() {
        let repo = Arc::new(ScriptedListRepo::new(vec![
            Ok(vec![post("a", 1)]),
            Err(RepoError::Timeout),
        ]));
        let (cache, clock) = cache_with(repo.clone(), Arc::default());
        let filter = PostFilter::default();

        cache.get(&filter).await;
        clock.advance(chrono::Duration::minutes(10));
        assert_eq!(slugs(&cache.get(&filter).await), ["a"]);
        assert_eq!(repo.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_first_fetch_is_empty() {
        let repo = Arc::new(ScriptedListRepo::new(vec![Err(RepoError::Transport(
            "connection refused".into(),
        ))]));
        let (cache, _clock) = cache_with(repo, Arc::default());
        assert!(cache.get(&PostFilter::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_hydrate_serves_durable_snapshot_without_network() {
        let store = Arc::new(MapCache::default());
        let snapshot = CachedListing {
            posts: vec![post("old", 1), post("new", 2)],
            fetched_at: at(0),
        };
        store.entries.lock().unwrap().insert(
            DEFAULT_LISTING_KEY.to_string(),
            serde_json::to_string(&snapshot).unwrap(),
        );
        let repo = Arc::new(ScriptedListRepo::default());
        let (cache, _clock) = cache_with(repo.clone(), store);

        let posts = cache.get(&PostFilter::default()).await;
        assert_eq!(slugs(&posts), ["new", "old"]);
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_is_dropped() {
        let store = Arc::new(MapCache::default());
        store
            .entries
            .lock()
            .unwrap()
            .insert(DEFAULT_LISTING_KEY.to_string(), "{not json".to_string());
        let repo = Arc::new(ScriptedListRepo::new(vec![Ok(vec![post("a", 1)])]));
        let (cache, _clock) = cache_with(repo.clone(), store.clone());

        assert_eq!(slugs(&cache.get(&PostFilter::default()).await), ["a"]);
        assert_eq!(repo.calls(), 1);
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_returns_snapshot_then_refreshes() {
        let repo = Arc::new(ScriptedListRepo::new(vec![
            Ok(vec![post("a", 1)]),
            Ok(vec![post("b", 2), post("a", 1)]),
        ]));
        let (cache, clock) = cache_with(repo.clone(), Arc::default());
        let filter = PostFilter::default();

        cache.get(&filter).await;
        clock.advance(chrono::Duration::minutes(6));

        let served = cache.get_stale_while_revalidate(&filter).await;
        assert_eq!(slugs(&served), ["a"]);

        for _ in 0..50 {
            if repo.calls() == 2 && cache.state(&filter).await == SlotState::Fresh {
                break;
            }
            tokio::task::yield_now().await;
        }
        let refreshed = cache.peek(&filter).await.unwrap();
        assert_eq!(slugs(&refreshed.posts), ["b", "a"]);
    }

    #[tokio::test]
    async fn test_slow_older_fetch_does_not_overwrite_newer() {
        let repo = Arc::new(ScriptedListRepo::new(vec![
            Ok(vec![post("old", 1)]),
            Ok(vec![post("new", 2)]),
        ]));
        let release = repo.gate_first_call();
        let (cache, _clock) = cache_with(repo.clone(), Arc::default());
        let filter = PostFilter::default();

        let slow = tokio::spawn({
            let cache = cache.clone();
            let filter = filter.clone();
            async move { cache.refresh(&filter).await }
        });
        while repo.calls() == 0 {
            tokio::task::yield_now().await;
        }

        cache.refresh(&filter).await.unwrap();
        release.send(()).unwrap();
        let late = slow.await.unwrap().unwrap();

        assert_eq!(slugs(&late), ["old"]);
        let stored = cache.peek(&filter).await.unwrap();
        assert_eq!(slugs(&stored.posts), ["new"]);
    }

    #[tokio::test]
    async fn test_fetch_started_before_invalidation_is_discarded() {
        let repo = Arc::new(ScriptedListRepo::new(vec![Ok(vec![post("old", 1)])]));
        let release = repo.gate_first_call();
        let (cache, _clock) = cache_with(repo.clone(), Arc::default());
        let filter = PostFilter::default();

        let inflight = tokio::spawn({
            let cache = cache.clone();
            let filter = filter.clone();
            async move { cache.refresh(&filter).await }
        });
        while repo.calls() == 0 {
            tokio::task::yield_now().await;
        }

        cache.invalidate(&filter).await;
        release.send(()).unwrap();
        inflight.await.unwrap().unwrap();

        assert_eq!(cache.state(&filter).await, SlotState::Empty);
    }

    #[tokio::test]
    async fn test_reads_are_not_blocked_by_durable_write() {
        let repo = Arc::new(ScriptedListRepo::new(vec![Ok(vec![post("a", 1)])]));
        let store = Arc::new(MapCache::default());
        let release = store.gate_next_set();
        let (cache, _clock) = cache_with(repo, store.clone());
        let filter = PostFilter::default();

        let writer = tokio::spawn({
            let cache = cache.clone();
            let filter = filter.clone();
            async move { cache.refresh(&filter).await }
        });
        while store.parked() == 0 {
            tokio::task::yield_now().await;
        }

        let served = tokio::time::timeout(Duration::from_secs(1), cache.peek(&filter))
            .await
            .expect("read waited on the durable write")
            .unwrap();
        assert_eq!(slugs(&served.posts), ["a"]);
        assert!(!store.entries.lock().unwrap().contains_key(DEFAULT_LISTING_KEY));

        release.send(()).unwrap();
        writer.await.unwrap().unwrap();
        assert!(store.entries.lock().unwrap().contains_key(DEFAULT_LISTING_KEY));
    }

    #[tokio::test]
    async fn test_invalidation_during_durable_write_wins() {
        let repo = Arc::new(ScriptedListRepo::new(vec![Ok(vec![post("a", 1)])]));
        let store = Arc::new(MapCache::default());
        let release = store.gate_next_set();
        let (cache, _clock) = cache_with(repo, store.clone());
        let filter = PostFilter::default();

        let writer = tokio::spawn({
            let cache = cache.clone();
            let filter = filter.clone();
            async move { cache.refresh(&filter).await }
        });
        while store.parked() == 0 {
            tokio::task::yield_now().await;
        }

        let invalidation = tokio::spawn({
            let cache = cache.clone();
            let filter = filter.clone();
            async move { cache.invalidate(&filter).await }
        });
        while cache.state(&filter).await != SlotState::Empty {
            tokio::task::yield_now().await;
        }
        release.send(()).unwrap();
        writer.await.unwrap().unwrap();
        invalidation.await.unwrap();

        assert!(!store.entries.lock().unwrap().contains_key(DEFAULT_LISTING_KEY));
        assert_eq!(cache.state(&filter).await, SlotState::Empty);
    }

    #[test]
    fn test_storage_keys() {
        assert_eq!(
            ListingCache::storage_key(&PostFilter::default()),
            DEFAULT_LISTING_KEY
        );
        assert_eq!(
            ListingCache::storage_key(&PostFilter::all()),
            "blogPosts:status=*;author=*"
        );
    }
}
