use std::{
    borrow::Borrow,
    hash::Hash,
    num::NonZeroUsize,
    sync::{PoisonError, RwLock},
    time::{Duration, Instant},
};

use lru::LruCache;

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// 带过期时间和容量上限的内存缓存
///
/// 超出容量时淘汰最久未使用的条目。
/// 没有 single-flight：并发未命中时每个调用方都会各自加载一次。
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<LruCache<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_at(key, Instant::now())
    }

    /// 读取 `now` 时刻仍然有效的值，过期条目顺便移除
    pub fn get_at<Q>(&self, key: &Q, now: Instant) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        // 读取会更新 LRU 顺序，需要写锁
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let fresh = entries
            .get(key)
            .map(|e| now.saturating_duration_since(e.stored_at) < self.ttl)?;

        if fresh {
            entries.get(key).map(|e| e.value.clone())
        } else {
            entries.pop(key);
            None
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now())
    }

    pub fn insert_at(&self, key: K, value: V, now: Instant) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .put(
                key,
                Entry {
                    value,
                    stored_at: now,
                },
            );
    }

    pub fn invalidate<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .pop(key);
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_expire_after_ttl() {
        let t0 = Instant::now();
        let cache: TtlCache<String, String> = TtlCache::new(Duration::from_secs(60));
        cache.insert_at("a".to_string(), "1".to_string(), t0);

        assert_eq!(cache.get_at("a", t0 + Duration::from_secs(59)), Some("1".into()));
        assert_eq!(cache.get_at("a", t0 + Duration::from_secs(60)), None);
        // 过期条目已被移除
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let t0 = Instant::now();
        let cache: TtlCache<&'static str, u32> =
            TtlCache::with_capacity(Duration::from_secs(60), 2);
        cache.insert_at("a", 1, t0);
        cache.insert_at("b", 2, t0);
        assert_eq!(cache.get_at("a", t0), Some(1));

        cache.insert_at("c", 3, t0);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at("b", t0), None);
        assert_eq!(cache.get_at("a", t0), Some(1));
        assert_eq!(cache.get_at("c", t0), Some(3));
    }

    #[test]
    fn test_zero_capacity_keeps_one_entry() {
        let cache: TtlCache<String, u32> = TtlCache::with_capacity(Duration::from_secs(60), 0);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);

        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));

        cache.clear();
        assert!(cache.is_empty());
    }
}
