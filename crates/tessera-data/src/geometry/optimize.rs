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

//! Mesh optimization passes run once per cache miss.

use super::MeshBuffers;
use std::collections::HashMap;
use tessera_core::math::Vec3;

/// Positions are quantized to this many steps per unit (4 decimal places)
/// before being compared for deduplication.
pub const QUANTIZATION_SCALE: f32 = 10_000.0;

/// Fills in vertex normals when the builder did not supply them.
///
/// Indexed meshes get smooth, area-weighted normals. Unindexed meshes get one
/// flat normal per triangle.
pub fn compute_vertex_normals(mesh: &mut MeshBuffers) {
    if mesh.normals.is_some() {
        return;
    }

    let positions = &mesh.positions;
    let normals = match &mesh.indices {
        Some(indices) => {
            let mut accumulated = vec![Vec3::ZERO; positions.len()];
            for tri in indices.chunks_exact(3) {
                let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
                let face = face_normal(positions[ia], positions[ib], positions[ic]);
                accumulated[ia] += face;
                accumulated[ib] += face;
                accumulated[ic] += face;
            }
            accumulated.iter().map(Vec3::normalize).collect()
        }
        None => {
            let mut flat = Vec::with_capacity(positions.len());
            for tri in positions.chunks_exact(3) {
                let face = face_normal(tri[0], tri[1], tri[2]).normalize();
                flat.extend_from_slice(&[face; 3]);
            }
            // A trailing partial triangle still needs a normal per vertex.
            flat.resize(positions.len(), Vec3::ZERO);
            flat
        }
    };

    mesh.normals = Some(normals);
}

/// Unnormalized face normal; its length is twice the triangle's area.
fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

/// Gives an unindexed mesh the trivial sequential index `0..vertex_count`.
pub fn ensure_indices(mesh: &mut MeshBuffers) {
    if mesh.indices.is_none() {
        mesh.indices = Some((0..mesh.positions.len() as u32).collect());
    }
}

/// Quantized position used as the deduplication hash key.
pub fn quantize(position: Vec3) -> [i64; 3] {
    [
        (position.x * QUANTIZATION_SCALE).round() as i64,
        (position.y * QUANTIZATION_SCALE).round() as i64,
        (position.z * QUANTIZATION_SCALE).round() as i64,
    ]
}

/// Merges vertices whose quantized positions are identical.
///
/// Vertices are visited in buffer order and the first occurrence of a
/// position survives together with its normal. The index buffer is rewritten
/// in place, so its length (and the face count) is unchanged. The mesh must be
/// indexed; call [`ensure_indices`] first.
///
/// Returns the number of vertices removed.
pub fn deduplicate_vertices(mesh: &mut MeshBuffers) -> usize {
    let before = mesh.positions.len();
    let mut first_seen: HashMap<[i64; 3], u32> = HashMap::with_capacity(before);
    let mut remap = Vec::with_capacity(before);
    let mut positions = Vec::with_capacity(before);
    let mut normals = mesh.normals.as_ref().map(|_| Vec::with_capacity(before));

    for (i, &position) in mesh.positions.iter().enumerate() {
        let next = positions.len() as u32;
        let target = *first_seen.entry(quantize(position)).or_insert_with(|| {
            positions.push(position);
            if let (Some(out), Some(src)) = (normals.as_mut(), mesh.normals.as_ref()) {
                out.push(src[i]);
            }
            next
        });
        remap.push(target);
    }

    if let Some(indices) = mesh.indices.as_mut() {
        for index in indices.iter_mut() {
            *index = remap[*index as usize];
        }
    }

    mesh.positions = positions;
    mesh.normals = normals;
    before - mesh.positions.len()
}
