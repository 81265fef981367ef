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

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tessera_data::{GeometryCache, ShapeKind, ShapeParams};

fn bench_cold_builds(c: &mut Criterion) {
    let mut group = c.benchmark_group("GeometryCache Cold Build");

    for kind in [ShapeKind::Sphere, ShapeKind::TorusKnot, ShapeKind::Dodecahedron] {
        group.bench_function(kind.as_str(), |b| {
            b.iter(|| {
                let mut cache = GeometryCache::new();
                black_box(cache.get(kind, black_box(ShapeParams::new(1.0, 1.0))).ok());
            })
        });
    }

    group.finish();
}

fn bench_warm_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("GeometryCache Warm Lookup");

    let mut cache = GeometryCache::new();
    let params = ShapeParams::new(1.5, 1.0);
    for kind in ShapeKind::ALL {
        let _ = cache.get(kind, params);
    }

    group.bench_function("hit", |b| {
        b.iter(|| black_box(cache.get(black_box(ShapeKind::Torus), params).ok()))
    });

    group.finish();
}

criterion_group!(benches, bench_cold_builds, bench_warm_lookup);
criterion_main!(benches);
