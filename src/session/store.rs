//! Ephemeral per-session result cache
//!
//! Keeps the most recent result set of every session and resolves callback
//! tokens back to the stored items. Sessions are evicted by capacity and
//! idle time, so the store never grows without bound.

use super::token::{CallbackToken, Generation};
use super::NotFound;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// An immutable, generation-stamped list of results
#[derive(Debug)]
pub struct ResultSet<T> {
    generation: Generation,
    items: Vec<T>,
}

impl<T> ResultSet<T> {
    /// Generation assigned when the set was stored
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Items in display order; the position is the callback index
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of items in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set holds no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn get(&self, index: usize) -> Result<&T, NotFound> {
        self.items.get(index).ok_or(NotFound::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }
}

/// Session-keyed store of the latest result set
///
/// `put` replaces the whole set for a session in one step. Two concurrent
/// `put` calls for the same key race with last-writer-wins semantics; a
/// reader always observes one complete set, never a mix of both.
///
/// Generic over the session key (`i64` chat id for Telegram) and the stored
/// item type.
pub struct SessionResultStore<K, T>
where
    K: Hash + Eq + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    sets: Cache<K, Arc<ResultSet<T>>>,
    next_generation: AtomicU64,
}

impl<K, T> SessionResultStore<K, T>
where
    K: Hash + Eq + Send + Sync + std::fmt::Debug + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Creates a store holding at most `max_sessions` sessions
    ///
    /// A session untouched for `idle` is dropped together with its results.
    /// When full, the least recently used session is evicted; a fresh `put`
    /// is always admitted.
    ///
    /// # Examples
    ///
    /// ```
    /// use media_relay_bot::session::SessionResultStore;
    /// use std::time::Duration;
    ///
    /// let store: SessionResultStore<i64, String> =
    ///     SessionResultStore::new(10_000, Duration::from_secs(3600));
    /// store.put(42, vec!["first".to_string(), "second".to_string()]);
    ///
    /// assert_eq!(store.resolve(&42, 1).ok(), Some("second".to_string()));
    /// assert!(store.resolve(&42, 2).is_err());
    /// ```
    #[must_use]
    pub fn new(max_sessions: u64, idle: Duration) -> Self {
        let sets = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self {
            sets,
            next_generation: AtomicU64::new(1),
        }
    }

    /// Replaces the session's result set and returns its generation
    ///
    /// Items are indexed from zero in the order given. Any previous set for
    /// the session becomes unreachable, including tokens issued for it.
    pub fn put(&self, key: K, items: Vec<T>) -> Generation {
        let generation = Generation(self.next_generation.fetch_add(1, Ordering::Relaxed));
        debug!(session = ?key, %generation, items = items.len(), "Storing result set");
        self.sets.insert(key, Arc::new(ResultSet { generation, items }));
        generation
    }

    /// Looks up the item at `index` in the session's current set
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::EmptySession`] if the session has no set and
    /// [`NotFound::IndexOutOfRange`] if `index` is past the end.
    pub fn resolve(&self, key: &K, index: usize) -> Result<T, NotFound> {
        let set = self.sets.get(key).ok_or(NotFound::EmptySession)?;
        set.get(index).cloned()
    }

    /// Resolves a callback token, rejecting tokens issued for a replaced set
    ///
    /// A token without a generation resolves against whatever set is current.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve), plus [`NotFound::StaleToken`] when
    /// the token's generation is not the active one.
    pub fn resolve_token(&self, key: &K, token: CallbackToken) -> Result<T, NotFound> {
        let set = self.sets.get(key).ok_or(NotFound::EmptySession)?;
        if let Some(generation) = token.generation {
            if generation != set.generation {
                return Err(NotFound::StaleToken {
                    token: generation,
                    active: set.generation,
                });
            }
        }
        set.get(token.index).cloned()
    }

    /// Current result set of the session, if any
    #[must_use]
    pub fn current(&self, key: &K) -> Option<Arc<ResultSet<T>>> {
        self.sets.get(key)
    }

    /// Drops the session's result set
    pub fn invalidate(&self, key: &K) {
        self.sets.invalidate(key);
    }

    /// Approximate number of live sessions
    ///
    /// Eviction is applied lazily; call after pending maintenance for an
    /// exact figure.
    #[must_use]
    pub fn session_count(&self) -> u64 {
        self.sets.run_pending_tasks();
        self.sets.entry_count()
    }
}
