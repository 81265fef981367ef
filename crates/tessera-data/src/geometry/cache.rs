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

//! The memoized geometry store.

use super::{optimize, shapes, GeometryError, MeshBuffers, ShapeKind, ShapeParams};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tessera_core::math::{Aabb, BoundingSphere};

/// A shared, immutable handle to a cached entry.
///
/// Two handles obtained for the same key point to the same allocation, which
/// can be checked with [`Arc::ptr_eq`].
pub type GeometryHandle = Arc<GeometryCacheEntry>;

/// An optimized mesh together with its bounds and build statistics.
#[derive(Debug)]
pub struct GeometryCacheEntry {
    /// The cache key this entry is stored under.
    pub key: String,
    /// The shape that was built.
    pub kind: ShapeKind,
    /// The quantized parameters it was built with.
    pub params: ShapeParams,
    /// Deduplicated, indexed mesh with normals.
    pub mesh: MeshBuffers,
    /// Axis-aligned bounds of the mesh.
    pub bounding_box: Aabb,
    /// Bounding sphere of the mesh.
    pub bounding_sphere: BoundingSphere,
    /// Vertices after deduplication.
    pub vertex_count: usize,
    /// Triangles in the index buffer.
    pub face_count: usize,
    /// Bytes held by the optimized buffers.
    pub memory_bytes: usize,
    /// Bytes the buffers held before deduplication.
    pub original_bytes: usize,
    /// `(original - optimized) / original * 100`.
    pub compression_ratio_percent: f32,
}

impl GeometryCacheEntry {
    /// Runs the full build pipeline for one key.
    fn build(key: String, kind: ShapeKind, params: ShapeParams) -> Result<Self, GeometryError> {
        let mut mesh = shapes::build(kind, &params);

        let bounding_box = Aabb::from_points(&mesh.positions).ok_or(GeometryError::EmptyMesh(kind))?;
        let bounding_sphere =
            BoundingSphere::from_points(&mesh.positions).ok_or(GeometryError::EmptyMesh(kind))?;

        optimize::compute_vertex_normals(&mut mesh);
        optimize::ensure_indices(&mut mesh);

        let original_bytes = mesh.byte_size();
        optimize::deduplicate_vertices(&mut mesh);
        let memory_bytes = mesh.byte_size();

        let compression_ratio_percent = if original_bytes > 0 {
            (original_bytes as f32 - memory_bytes as f32) / original_bytes as f32 * 100.0
        } else {
            0.0
        };

        Ok(Self {
            key,
            kind,
            params,
            vertex_count: mesh.vertex_count(),
            face_count: mesh.face_count(),
            memory_bytes,
            original_bytes,
            compression_ratio_percent,
            bounding_box,
            bounding_sphere,
            mesh,
        })
    }

    /// Bytes removed by the optimization pipeline.
    pub fn bytes_saved(&self) -> usize {
        self.original_bytes.saturating_sub(self.memory_bytes)
    }
}

/// Validates `params` and returns the key together with the quantized
/// parameters the entry is built from.
pub(crate) fn prepare(kind: ShapeKind, params: ShapeParams) -> Result<(String, ShapeParams), GeometryError> {
    params.validate()?;
    let params = params.quantized(kind);
    // A tiny radius can round down to zero.
    params.validate()?;
    Ok((params.cache_key(kind), params))
}

/// A point-in-time copy of the cache-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Requests served from the cache.
    pub hits: u64,
    /// Requests that triggered a build.
    pub misses: u64,
    /// Sum of bytes saved by deduplication over all entries.
    pub total_bytes_saved: u64,
    /// Sum of the optimized sizes of all entries.
    pub total_memory_bytes: u64,
    /// Byte-weighted compression over all entries.
    pub average_compression_ratio_percent: f32,
    /// Number of entries.
    pub cache_size: usize,
}

impl CacheStats {
    /// Fraction of requests served from the cache, in `[0, 1]`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Memoized store of optimized procedural meshes.
///
/// Each distinct `(kind, params)` key is built at most once; every later
/// request returns the same [`GeometryHandle`]. Entries are only dropped by a
/// whole-cache [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct GeometryCache {
    entries: HashMap<String, GeometryHandle>,
    // Atomic so that hits can be recorded under a shared borrow.
    hits: AtomicU64,
    misses: u64,
    total_original_bytes: u64,
    total_memory_bytes: u64,
}

impl GeometryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `(kind, params)`, building it on first request.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidParameter`] for out-of-domain
    /// parameters. Nothing is built or counted in that case.
    pub fn get(&mut self, kind: ShapeKind, params: ShapeParams) -> Result<GeometryHandle, GeometryError> {
        let (key, params) = prepare(kind, params)?;
        if let Some(handle) = self.lookup(&key) {
            return Ok(handle);
        }
        self.build_and_insert(key, kind, params)
    }

    /// Like [`get`](Self::get), with the shape given by name.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnknownShape`] if `name` is not a known shape.
    pub fn get_by_name(&mut self, name: &str, params: ShapeParams) -> Result<GeometryHandle, GeometryError> {
        let kind: ShapeKind = name.parse()?;
        self.get(kind, params)
    }

    /// Whether an entry for `(kind, params)` exists. Does not touch the counters.
    pub fn contains(&self, kind: ShapeKind, params: ShapeParams) -> bool {
        self.entries.contains_key(&params.cache_key(kind))
    }

    /// Looks `key` up and records a hit if it is present.
    pub(crate) fn lookup(&self, key: &str) -> Option<GeometryHandle> {
        let handle = self.entries.get(key)?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        log::trace!("Geometry cache hit: {key}");
        Some(Arc::clone(handle))
    }

    /// Builds and inserts the entry for a key known to be absent.
    pub(crate) fn build_and_insert(
        &mut self,
        key: String,
        kind: ShapeKind,
        params: ShapeParams,
    ) -> Result<GeometryHandle, GeometryError> {
        self.misses += 1;
        let entry = GeometryCacheEntry::build(key.clone(), kind, params)?;
        log::debug!(
            "Geometry cache miss: built '{}' ({} vertices, {} faces, {}, {:.1}% smaller)",
            key,
            entry.vertex_count,
            entry.face_count,
            format_bytes(entry.memory_bytes as u64),
            entry.compression_ratio_percent
        );

        self.total_original_bytes += entry.original_bytes as u64;
        self.total_memory_bytes += entry.memory_bytes as u64;

        let handle = Arc::new(entry);
        self.entries.insert(key, Arc::clone(&handle));
        Ok(handle)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A snapshot of the cache-wide counters.
    pub fn stats(&self) -> CacheStats {
        let saved = self.total_original_bytes.saturating_sub(self.total_memory_bytes);
        let average_compression_ratio_percent = if self.total_original_bytes > 0 {
            saved as f32 / self.total_original_bytes as f32 * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses,
            total_bytes_saved: saved,
            total_memory_bytes: self.total_memory_bytes,
            average_compression_ratio_percent,
            cache_size: self.entries.len(),
        }
    }

    /// Drops every entry and resets all counters.
    ///
    /// Handles already given out stay valid; their buffers are freed when the
    /// last one is dropped.
    pub fn clear(&mut self) {
        log::info!("Clearing geometry cache ({} entries)", self.entries.len());
        self.entries.clear();
        *self.hits.get_mut() = 0;
        self.misses = 0;
        self.total_original_bytes = 0;
        self.total_memory_bytes = 0;
    }

    /// A human-readable projection of the cache for dashboards.
    pub fn report(&self) -> CacheReport {
        let stats = self.stats();
        let mut geometries: Vec<CacheReportEntry> = self
            .entries
            .values()
            .map(|entry| CacheReportEntry {
                key: entry.key.clone(),
                vertices: entry.vertex_count,
                faces: entry.face_count,
                memory_usage: format_bytes(entry.memory_bytes as u64),
                compression_ratio: format!("{:.1}%", entry.compression_ratio_percent),
            })
            .collect();
        geometries.sort_by(|a, b| a.key.cmp(&b.key));

        CacheReport {
            cache_size: stats.cache_size,
            cache_hit_rate: format!("{:.1}%", stats.hit_rate() * 100.0),
            total_memory_usage: format_bytes(stats.total_memory_bytes),
            memory_saved: format_bytes(stats.total_bytes_saved),
            average_compression: format!("{:.1}%", stats.average_compression_ratio_percent),
            geometries,
        }
    }
}

/// Summary produced by [`GeometryCache::report`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheReport {
    pub cache_size: usize,
    pub cache_hit_rate: String,
    pub total_memory_usage: String,
    pub memory_saved: String,
    pub average_compression: String,
    /// One row per entry, sorted by key.
    pub geometries: Vec<CacheReportEntry>,
}

/// One row of a [`CacheReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheReportEntry {
    pub key: String,
    pub vertices: usize,
    pub faces: usize,
    pub memory_usage: String,
    pub compression_ratio: String,
}

/// Formats a byte count with 1024-based units, e.g. `1.5 KB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_request_is_a_hit_on_the_same_entry() {
        let mut cache = GeometryCache::new();
        let params = ShapeParams::new(1.0, 1.0);

        let first = cache.get(ShapeKind::Sphere, params).unwrap();
        let second = cache.get(ShapeKind::Sphere, params).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.cache_size, 1);
    }

    #[test]
    fn test_entry_is_built_from_quantized_params() {
        let mut warm = GeometryCache::new();
        let first = warm.get(ShapeKind::TorusKnot, ShapeParams::new(1.999_96, 1.0)).unwrap();
        let second = warm.get(ShapeKind::TorusKnot, ShapeParams::new(2.0, 1.0)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.params, ShapeParams::new(2.0, 1.0));

        let mut cold = GeometryCache::new();
        let fresh = cold.get(ShapeKind::TorusKnot, ShapeParams::new(2.0, 1.0)).unwrap();
        assert_eq!(first.vertex_count, fresh.vertex_count);
        assert_eq!(first.face_count, fresh.face_count);
        assert_eq!(first.mesh, fresh.mesh);
    }

    #[test]
    fn test_radius_rounding_to_zero_is_rejected() {
        let mut cache = GeometryCache::new();
        let result = cache.get(ShapeKind::Sphere, ShapeParams::new(1.0, 0.000_01));
        assert!(matches!(result, Err(GeometryError::InvalidParameter { name: "radius", .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sphere_dedup_collapses_seam_and_poles() {
        let mut cache = GeometryCache::new();
        let entry = cache.get(ShapeKind::Sphere, ShapeParams::new(1.0, 1.0)).unwrap();
        // 15 interior rings of 32 vertices plus the two poles.
        assert_eq!(entry.vertex_count, 15 * 32 + 2);
        assert_eq!(entry.face_count, 32 * 30);
        assert!(entry.compression_ratio_percent > 0.0);
        assert!(entry.memory_bytes < entry.original_bytes);
    }

    #[test]
    fn test_entry_bounds_enclose_the_mesh() {
        let mut cache = GeometryCache::new();
        for kind in ShapeKind::ALL {
            let entry = cache.get(kind, ShapeParams::new(1.0, 1.0)).unwrap();
            for &p in &entry.mesh.positions {
                assert!(entry.bounding_box.contains_point(p), "{kind}");
                assert!(entry.bounding_sphere.contains_point(p), "{kind}");
            }
        }
    }

    #[test]
    fn test_every_entry_is_indexed_with_normals() {
        let mut cache = GeometryCache::new();
        for kind in ShapeKind::ALL {
            let entry = cache.get(kind, ShapeParams::default()).unwrap();
            let indices = entry.mesh.indices.as_ref().unwrap();
            assert_eq!(
                entry.mesh.normals.as_ref().map(Vec::len),
                Some(entry.vertex_count)
            );
            assert!(indices.iter().all(|&i| (i as usize) < entry.vertex_count));
            assert_eq!(entry.face_count, indices.len() / 3);
        }
    }

    #[test]
    fn test_invalid_parameters_do_not_count_as_misses() {
        let mut cache = GeometryCache::new();
        let result = cache.get(ShapeKind::Torus, ShapeParams::new(1.0, -2.0));
        assert!(matches!(result, Err(GeometryError::InvalidParameter { name: "radius", .. })));
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_get_by_name_rejects_unknown_shapes() {
        let mut cache = GeometryCache::new();
        let err = cache.get_by_name("teapot", ShapeParams::default()).unwrap_err();
        assert_eq!(err, GeometryError::UnknownShape("teapot".into()));
        assert!(cache.is_empty());
        assert!(cache.get_by_name("torus_knot", ShapeParams::default()).is_ok());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut cache = GeometryCache::new();
        let params = ShapeParams::default();
        cache.get(ShapeKind::Octahedron, params).unwrap();
        cache.get(ShapeKind::Octahedron, params).unwrap();

        cache.clear();

        assert_eq!(cache.stats(), CacheStats::default());
        cache.get(ShapeKind::Octahedron, params).unwrap();
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_stats_are_weighted_by_size() {
        let mut cache = GeometryCache::new();
        let a = cache.get(ShapeKind::Sphere, ShapeParams::new(2.0, 1.0)).unwrap();
        let b = cache.get(ShapeKind::Tetrahedron, ShapeParams::new(0.0, 1.0)).unwrap();
        let stats = cache.stats();

        let original = (a.original_bytes + b.original_bytes) as f32;
        let optimized = (a.memory_bytes + b.memory_bytes) as f32;
        let expected = (original - optimized) / original * 100.0;
        assert!((stats.average_compression_ratio_percent - expected).abs() < 1e-3);
        assert_eq!(stats.total_bytes_saved, (a.bytes_saved() + b.bytes_saved()) as u64);
    }

    #[test]
    fn test_report_lists_entries_sorted_by_key() {
        let mut cache = GeometryCache::new();
        cache.get(ShapeKind::Torus, ShapeParams::default()).unwrap();
        cache.get(ShapeKind::Sphere, ShapeParams::default()).unwrap();
        cache.get(ShapeKind::Sphere, ShapeParams::default()).unwrap();

        let report = cache.report();
        assert_eq!(report.cache_size, 2);
        assert_eq!(report.cache_hit_rate, "33.3%");
        let keys: Vec<_> = report.geometries.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, ["sphere_d1.0000_r1.0000", "torus_d1.0000_r1.0000"]);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024 * 1024), "3072 GB");
    }
}
