use std::sync::Arc;

use log::debug;
use lru::LruCache;
use pageturn_core::AssetKey;

#[derive(Clone, Debug)]
pub(super) struct CachedAsset {
    pub(super) bytes: Arc<[u8]>,
    pub(super) width: u32,
    pub(super) height: u32,
}

/// Loaded asset bytes, bounded by a byte budget and evicted least recently used first.
pub(super) struct AssetCache {
    max_bytes: usize,
    bytes: usize,
    entries: LruCache<AssetKey, CachedAsset>,
}

impl AssetCache {
    pub(super) fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            bytes: 0,
            entries: LruCache::unbounded(),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(super) fn bytes(&self) -> usize {
        self.bytes
    }

    pub(super) fn get(&mut self, key: AssetKey) -> Option<CachedAsset> {
        self.entries.get(&key).cloned()
    }

    pub(super) fn insert(&mut self, key: AssetKey, asset: CachedAsset) {
        let size = asset.bytes.len();
        if let Some(existing) = self.entries.put(key, asset) {
            self.bytes = self.bytes.saturating_sub(existing.bytes.len());
        }
        self.bytes = self.bytes.saturating_add(size);

        while self.bytes > self.max_bytes {
            let Some((evicted_key, evicted)) = self.entries.pop_lru() else {
                break;
            };
            self.bytes = self.bytes.saturating_sub(evicted.bytes.len());
            debug!(
                "cache: budget eviction key={:?} bytes={} used={}",
                evicted_key,
                evicted.bytes.len(),
                self.bytes
            );
        }
    }

    pub(super) fn remove(&mut self, key: AssetKey) -> bool {
        match self.entries.pop(&key) {
            Some(asset) => {
                self.bytes = self.bytes.saturating_sub(asset.bytes.len());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u16) -> AssetKey {
        AssetKey::Page { chapter: 0, page }
    }

    fn asset(size: usize) -> CachedAsset {
        CachedAsset {
            bytes: vec![0u8; size].into(),
            width: 10,
            height: 20,
        }
    }

    #[test]
    fn evicts_least_recently_used_over_budget() {
        let mut cache = AssetCache::new(300);
        cache.insert(page(0), asset(100));
        cache.insert(page(1), asset(100));
        cache.insert(page(2), asset(100));
        assert!(cache.get(page(0)).is_some());

        cache.insert(page(3), asset(100));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.bytes(), 300);
        assert!(cache.get(page(1)).is_none());
        assert!(cache.get(page(0)).is_some());
    }

    #[test]
    fn replacing_and_removing_keeps_byte_count() {
        let mut cache = AssetCache::new(1_000);
        cache.insert(page(0), asset(400));
        cache.insert(page(0), asset(100));
        assert_eq!(cache.bytes(), 100);

        assert!(cache.remove(page(0)));
        assert!(!cache.remove(page(0)));
        assert_eq!(cache.bytes(), 0);
    }

    #[test]
    fn oversized_entry_is_not_retained() {
        let mut cache = AssetCache::new(50);
        cache.insert(page(0), asset(80));
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.bytes(), 0);
    }
}
