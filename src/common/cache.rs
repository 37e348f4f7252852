use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

/// 线程安全的键值缓存，克隆后共享同一份存储。
pub struct SharedCache<K, V> {
    store: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Clone for SharedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> SharedCache<K, V> {
    pub fn new() -> Self {
        SharedCache {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        store.get(key).cloned()
    }

    /// 命中时直接返回；否则构造新值写入。并发构造同一个键时保留先写入的值。
    pub fn get_or_try_insert<E>(&self, key: &K, build: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = build()?;
        let mut store = self.store.write().unwrap_or_else(|e| e.into_inner());
        Ok(store.entry(key.clone()).or_insert(value).clone())
    }

    pub fn len(&self) -> usize {
        self.store.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_try_insert() {
        let cache: SharedCache<String, usize> = SharedCache::new();
        let key = "a".to_string();

        let first: Result<usize, ()> = cache.get_or_try_insert(&key, || Ok(1));
        assert_eq!(first, Ok(1));

        let second: Result<usize, ()> = cache.get_or_try_insert(&key, || Ok(2));
        assert_eq!(second, Ok(1));

        let failed: Result<usize, &str> = cache.get_or_try_insert(&"b".to_string(), || Err("boom"));
        assert_eq!(failed, Err("boom"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.clone().get(&key), Some(1));
    }
}
