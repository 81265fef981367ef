// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A thread-safe wrapper around [`GeometryCache`].

use super::cache::prepare;
use super::{CacheReport, CacheStats, GeometryCache, GeometryError, GeometryHandle, ShapeKind, ShapeParams};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A cloneable, thread-safe geometry cache for hosts that build meshes from
/// several worker threads.
///
/// Hits only take the read lock. A miss takes the write lock and checks the
/// key again before building, so a key is still built at most once when two
/// threads miss on it at the same time.
#[derive(Debug, Clone, Default)]
pub struct SharedGeometryCache {
    inner: Arc<RwLock<GeometryCache>>,
}

impl SharedGeometryCache {
    /// Creates an empty shared cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`GeometryCache::get`].
    pub fn get(&self, kind: ShapeKind, params: ShapeParams) -> Result<GeometryHandle, GeometryError> {
        let (key, params) = prepare(kind, params)?;

        if let Some(handle) = self.read().lookup(&key) {
            return Ok(handle);
        }

        let mut cache = self.write();
        // Another thread may have built it between the two locks.
        if let Some(handle) = cache.lookup(&key) {
            return Ok(handle);
        }
        cache.build_and_insert(key, kind, params)
    }

    /// See [`GeometryCache::get_by_name`].
    pub fn get_by_name(&self, name: &str, params: ShapeParams) -> Result<GeometryHandle, GeometryError> {
        self.get(name.parse()?, params)
    }

    /// See [`GeometryCache::stats`].
    pub fn stats(&self) -> CacheStats {
        self.read().stats()
    }

    /// See [`GeometryCache::report`].
    pub fn report(&self) -> CacheReport {
        self.read().report()
    }

    /// See [`GeometryCache::clear`].
    pub fn clear(&self) {
        self.write().clear();
    }

    // A panic while building leaves the map consistent: entries are only
    // inserted once fully built. Poisoning is therefore recovered.
    fn read(&self) -> RwLockReadGuard<'_, GeometryCache> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GeometryCache> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_requests_build_once() {
        let cache = SharedGeometryCache::new();
        let params = ShapeParams::new(2.0, 1.0);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || cache.get(ShapeKind::TorusKnot, params).unwrap())
            })
            .collect();
        let entries: Vec<GeometryHandle> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for entry in &entries[1..] {
            assert!(Arc::ptr_eq(&entries[0], entry));
        }
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 7);
        assert_eq!(stats.cache_size, 1);
    }

    #[test]
    fn test_clones_share_the_same_store() {
        let a = SharedGeometryCache::new();
        let b = a.clone();
        a.get(ShapeKind::Sphere, ShapeParams::default()).unwrap();
        b.get(ShapeKind::Sphere, ShapeParams::default()).unwrap();
        assert_eq!(b.stats().hits, 1);
        b.clear();
        assert_eq!(a.stats().cache_size, 0);
    }
}
