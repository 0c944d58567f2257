//! Size-bounded memoization for pure functions, built on the same
//! [`LruStorage`] engine as the disk cache, guarded by a `parking_lot::Mutex`
//! held only for the lookup-or-compute critical section.

use std::hash::Hash;

use parking_lot::Mutex;

use crate::lru_storage::{CacheSized, LruStorage};

/// A value whose accounting size is always 1 — used to bound a memo cache by
/// entry count rather than by byte size.
#[derive(Debug, Clone)]
pub struct Unsized<T>(pub T);

impl<T> CacheSized for Unsized<T> {
    fn cache_size(&self) -> u64 {
        1
    }
}

/// Caches the results of a pure function, evicting least-recently-used
/// entries once `budget` (interpreted via `V::cache_size`) is exceeded.
pub struct Memo<K, V> {
    storage: Mutex<LruStorage<K, V>>,
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Clone,
    V: CacheSized + Clone,
{
    pub fn new(budget: u64) -> Self {
        Memo { storage: Mutex::new(LruStorage::new(budget)) }
    }

    /// Returns the cached value for `key`, computing and storing it via `f`
    /// on a miss. The lock is held only across each map lookup/insert, not
    /// across `f`, so concurrent misses for the same key may both compute —
    /// acceptable for a pure-function cache, where recomputation is wasted
    /// work but never incorrect.
    pub fn get_or_insert_with(&self, key: K, f: impl FnOnce() -> V) -> V {
        {
            let mut guard = self.storage.lock();
            if let Some(value) = guard.get(&key) {
                let value = value.clone();
                guard.touch(&key);
                return value;
            }
        }
        let value = f();
        let mut guard = self.storage.lock();
        guard.insert(key, value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.storage.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.lock().is_empty()
    }

    pub fn clear(&self) {
        self.storage.lock().clear();
    }
}

impl<K, V> std::fmt::Debug for Memo<K, V>
where
    K: Eq + Hash + Clone,
    V: CacheSized + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn computes_once_per_key() {
        let memo: Memo<u32, Unsized<u32>> = Memo::new(10);
        let calls = AtomicU32::new(0);

        let a = memo.get_or_insert_with(1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Unsized(100)
        });
        let b = memo.get_or_insert_with(1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Unsized(999)
        });

        assert_eq!(a.0, 100);
        assert_eq!(b.0, 100);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn evicts_when_budget_exceeded() {
        let memo: Memo<u32, Unsized<u32>> = Memo::new(2);
        memo.get_or_insert_with(1, || Unsized(1));
        memo.get_or_insert_with(2, || Unsized(2));
        memo.get_or_insert_with(3, || Unsized(3));
        assert_eq!(memo.len(), 2);
    }
}
