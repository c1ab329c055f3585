//! Duplicate-delivery suppression for webhook events
//!
//! Telegram delivers webhook updates at least once and redelivers when an
//! acknowledgement is slow or lost. This cache remembers recently dispatched
//! update ids so a redelivered copy is acknowledged without being processed
//! again, including while the first copy is still in flight.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use tokio::sync::Mutex;
use tracing::debug;

/// Default number of remembered event ids
pub const IDEMPOTENCY_CACHE_MAX_SIZE: usize = 1000;

struct SeenIds<K> {
    members: HashSet<K>,
    arrival: VecDeque<K>,
}

/// Bounded set of already dispatched event ids
///
/// Eviction follows arrival order: once the cache is full, admitting a new
/// id drops the oldest admitted one. Identifier magnitude plays no role.
pub struct IdempotencyCache<K = i64> {
    capacity: usize,
    inner: Mutex<SeenIds<K>>,
}

impl<K> Default for IdempotencyCache<K>
where
    K: Hash + Eq + Clone + Send + std::fmt::Debug,
{
    fn default() -> Self {
        Self::new(IDEMPOTENCY_CACHE_MAX_SIZE)
    }
}

impl<K> IdempotencyCache<K>
where
    K: Hash + Eq + Clone + Send + std::fmt::Debug,
{
    /// Creates a cache holding at most `capacity` ids (at least one).
    ///
    /// # Examples
    ///
    /// ```
    /// use tubetutor_core::idempotency::IdempotencyCache;
    ///
    /// # async fn example() {
    /// let cache: IdempotencyCache<i64> = IdempotencyCache::new(1000);
    /// assert!(cache.check_and_mark(42).await);
    /// assert!(!cache.check_and_mark(42).await);
    /// # }
    /// ```
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(SeenIds {
                members: HashSet::with_capacity(capacity),
                arrival: VecDeque::with_capacity(capacity),
            }),
        }
    }

    /// Returns `true` if `id` has been marked and not yet evicted
    pub async fn seen(&self, id: &K) -> bool {
        self.inner.lock().await.members.contains(id)
    }

    /// Records `id` as dispatched.
    ///
    /// Marking an id that is already present changes nothing, in particular
    /// it does not move the id to the back of the eviction order.
    pub async fn mark_seen(&self, id: K) {
        let mut inner = self.inner.lock().await;
        self.admit(&mut inner, id);
    }

    /// Atomically checks and marks `id`.
    ///
    /// Returns `true` if the id was new (the caller should dispatch it) and
    /// `false` for a duplicate. Two concurrent calls with the same id never
    /// both return `true`.
    pub async fn check_and_mark(&self, id: K) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.members.contains(&id) {
            debug!(?id, "Duplicate event suppressed");
            return false;
        }
        self.admit(&mut inner, id);
        true
    }

    fn admit(&self, inner: &mut SeenIds<K>, id: K) {
        if !inner.members.insert(id.clone()) {
            return;
        }
        inner.arrival.push_back(id);

        while inner.arrival.len() > self.capacity {
            if let Some(oldest) = inner.arrival.pop_front() {
                inner.members.remove(&oldest);
            }
        }
    }

    /// Number of remembered ids
    pub async fn len(&self) -> usize {
        self.inner.lock().await.members.len()
    }

    /// Returns `true` if nothing has been marked yet
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.members.is_empty()
    }

    /// Maximum number of remembered ids
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
