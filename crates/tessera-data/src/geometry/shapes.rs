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

//! Procedural mesh builders.
//!
//! Every builder scales its segment counts by `detail` and clamps them to a
//! shape-specific range. The output is the naive construction: seams and poles
//! repeat vertices, and the polyhedra are emitted as raw triangle soup. The
//! optimization pipeline in [`super::optimize`] is what cleans this up.

use super::{MeshBuffers, ShapeKind, ShapeParams};
use tessera_core::math::{Vec3, EPSILON, PI, TAU};

/// Tube radius of the torus and torus knot, relative to the shape radius.
const TUBE_RATIO: f32 = 0.3;
/// Winding numbers of the torus knot.
const KNOT_P: f32 = 2.0;
const KNOT_Q: f32 = 3.0;
/// Extrusion depth of the prism.
const PRISM_DEPTH: f32 = 0.5;
/// Most depth steps the prism walls are split into.
const MAX_PRISM_STEPS: u32 = 24;
/// Scale of the figure-eight curve swept by the ribbon.
const RIBBON_CURVE_SCALE: f32 = 2.0;
/// Highest subdivision level accepted for the polyhedra.
const MAX_POLYHEDRON_SUBDIVISIONS: u32 = 5;

/// Builds the naive mesh for `kind`.
///
/// `params` is expected to be validated already.
pub fn build(kind: ShapeKind, params: &ShapeParams) -> MeshBuffers {
    let ShapeParams { detail, radius } = *params;
    match kind {
        ShapeKind::Sphere => sphere(
            radius,
            scaled_segments(32.0, detail, 8, 64),
            scaled_segments(16.0, detail, 6, 32),
        ),
        ShapeKind::Torus => torus(
            radius,
            radius * TUBE_RATIO,
            scaled_segments(16.0, detail, 8, 32),
            scaled_segments(32.0, detail, 16, 64),
        ),
        ShapeKind::TorusKnot => torus_knot(
            radius,
            radius * TUBE_RATIO,
            scaled_segments(100.0, detail, 64, 200),
            scaled_segments(16.0, detail, 8, 32),
        ),
        ShapeKind::HexagonalPrism => prism(
            radius,
            scaled_segments(6.0, detail, 6, 12),
            scaled_segments(2.0, detail, 1, MAX_PRISM_STEPS),
        ),
        ShapeKind::Tetrahedron => polyhedron(
            &TETRAHEDRON_VERTICES,
            &TETRAHEDRON_INDICES,
            radius,
            polyhedron_subdivisions(detail),
        ),
        ShapeKind::Octahedron => polyhedron(
            &OCTAHEDRON_VERTICES,
            &OCTAHEDRON_INDICES,
            radius,
            polyhedron_subdivisions(detail),
        ),
        ShapeKind::Dodecahedron => polyhedron(
            &dodecahedron_vertices(),
            &DODECAHEDRON_INDICES,
            radius,
            polyhedron_subdivisions(detail),
        ),
        ShapeKind::Ribbon => ribbon(
            radius,
            scaled_segments(100.0, detail, 32, 200),
            scaled_segments(8.0, detail, 6, 16),
        ),
    }
}

/// `floor(base * detail)` clamped to `[min, max]`.
pub fn scaled_segments(base: f32, detail: f32, min: u32, max: u32) -> u32 {
    let scaled = (base * detail).floor();
    if scaled.is_nan() {
        return min;
    }
    (scaled.max(0.0) as u32).clamp(min, max)
}

/// Subdivision level used by the polyhedra for a given detail.
pub fn polyhedron_subdivisions(detail: f32) -> u32 {
    let rounded = detail.round();
    if rounded.is_nan() {
        return 0;
    }
    (rounded.max(0.0) as u32).min(MAX_POLYHEDRON_SUBDIVISIONS)
}

// ── Parametric surfaces ──

fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshBuffers {
    let row_len = width_segments + 1;
    let mut positions = Vec::with_capacity(((height_segments + 1) * row_len) as usize);
    let mut normals = Vec::with_capacity(positions.capacity());

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let position = Vec3::new(
                -radius * (u * TAU).cos() * (v * PI).sin(),
                radius * (v * PI).cos(),
                radius * (u * TAU).sin() * (v * PI).sin(),
            );
            normals.push(position.normalize());
            positions.push(position);
        }
    }

    let mut indices = Vec::new();
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row_len + ix + 1;
            let b = iy * row_len + ix;
            let c = (iy + 1) * row_len + ix;
            let d = (iy + 1) * row_len + ix + 1;
            // The pole rows collapse to a point, so they only get one triangle.
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    MeshBuffers {
        positions,
        normals: Some(normals),
        indices: Some(indices),
    }
}

fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> MeshBuffers {
    let mut positions = Vec::new();
    let mut normals = Vec::new();

    for j in 0..=radial_segments {
        let v = j as f32 / radial_segments as f32 * TAU;
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * TAU;
            let position = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            normals.push((position - center).normalize());
            positions.push(position);
        }
    }

    MeshBuffers {
        positions,
        normals: Some(normals),
        indices: Some(grid_indices(radial_segments, tubular_segments)),
    }
}

fn torus_knot(radius: f32, tube: f32, tubular_segments: u32, radial_segments: u32) -> MeshBuffers {
    let curve = |u: f32| {
        let quo_p = KNOT_Q / KNOT_P * u;
        let cs = quo_p.cos();
        Vec3::new(
            radius * (2.0 + cs) * 0.5 * u.cos(),
            radius * (2.0 + cs) * 0.5 * u.sin(),
            radius * quo_p.sin() * 0.5,
        )
    };

    let mut rings = Vec::with_capacity(tubular_segments as usize + 1);
    for i in 0..=tubular_segments {
        let u = i as f32 / tubular_segments as f32 * KNOT_P * TAU;
        let p1 = curve(u);
        let p2 = curve(u + 0.01);
        let tangent = p2 - p1;
        let binormal = tangent.cross(p2 + p1);
        let normal = binormal.cross(tangent);
        rings.push(Frame {
            origin: p1,
            normal: normal.normalize(),
            binormal: binormal.normalize(),
        });
    }

    sweep(&rings, tube, radial_segments)
}

fn ribbon(tube: f32, tubular_segments: u32, radial_segments: u32) -> MeshBuffers {
    let curve = |t: f32| {
        Vec3::new(
            (TAU * t).sin(),
            (2.0 * TAU * t).sin() * 0.5,
            (TAU * t).cos() * 0.5,
        ) * RIBBON_CURVE_SCALE
    };
    let tangent_at = |t: f32| {
        let delta = 1e-4;
        (curve(t + delta) - curve(t - delta)).normalize()
    };

    // Parallel transport keeps the tube from twisting along the curve.
    let mut rings = Vec::with_capacity(tubular_segments as usize + 1);
    let mut previous_tangent = tangent_at(0.0);
    let mut normal = any_perpendicular(previous_tangent);
    for i in 0..=tubular_segments {
        let t = i as f32 / tubular_segments as f32;
        let tangent = tangent_at(t);
        let axis = previous_tangent.cross(tangent);
        if axis.length() > EPSILON {
            let angle = previous_tangent.dot(tangent).clamp(-1.0, 1.0).acos();
            normal = rotate_about(normal, axis.normalize(), angle);
        }
        let binormal = tangent.cross(normal).normalize();
        rings.push(Frame {
            origin: curve(t),
            normal,
            binormal,
        });
        previous_tangent = tangent;
    }

    sweep(&rings, tube, radial_segments)
}

struct Frame {
    origin: Vec3,
    normal: Vec3,
    binormal: Vec3,
}

/// Sweeps a circle of radius `tube` through every frame.
fn sweep(rings: &[Frame], tube: f32, radial_segments: u32) -> MeshBuffers {
    let mut positions = Vec::with_capacity(rings.len() * (radial_segments as usize + 1));
    let mut normals = Vec::with_capacity(positions.capacity());

    for frame in rings {
        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            let cx = -tube * v.cos();
            let cy = tube * v.sin();
            let position = frame.origin + frame.normal * cx + frame.binormal * cy;
            normals.push((position - frame.origin).normalize());
            positions.push(position);
        }
    }

    let segments = rings.len().saturating_sub(1) as u32;
    MeshBuffers {
        positions,
        normals: Some(normals),
        indices: Some(grid_indices(segments, radial_segments)),
    }
}

/// Indexes a `(rows + 1) x (cols + 1)` vertex grid as two triangles per cell.
fn grid_indices(rows: u32, cols: u32) -> Vec<u32> {
    let stride = cols + 1;
    let mut indices = Vec::with_capacity((rows * cols * 6) as usize);
    for j in 1..=rows {
        for i in 1..=cols {
            let a = stride * j + i - 1;
            let b = stride * (j - 1) + i - 1;
            let c = stride * (j - 1) + i;
            let d = stride * j + i;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    indices
}

fn any_perpendicular(v: Vec3) -> Vec3 {
    let axis = if v.x.abs() <= v.y.abs() && v.x.abs() <= v.z.abs() {
        Vec3::X
    } else if v.y.abs() <= v.z.abs() {
        Vec3::Y
    } else {
        Vec3::Z
    };
    v.cross(axis).normalize()
}

/// Rodrigues rotation of `v` around the unit vector `axis`.
fn rotate_about(v: Vec3, axis: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    v * cos + axis.cross(v) * sin + axis * (axis.dot(v) * (1.0 - cos))
}

// ── Extrusion ──

/// A regular polygon extruded along +Z, emitted unindexed with flat normals.
fn prism(radius: f32, sides: u32, steps: u32) -> MeshBuffers {
    let outline: Vec<Vec3> = (0..sides)
        .map(|i| {
            let angle = i as f32 / sides as f32 * TAU;
            Vec3::new(angle.cos() * radius, angle.sin() * radius, 0.0)
        })
        .collect();
    let at_depth = |p: Vec3, z: f32| Vec3::new(p.x, p.y, z);

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut push_triangle = |a: Vec3, b: Vec3, c: Vec3, normal: Vec3| {
        positions.extend_from_slice(&[a, b, c]);
        normals.extend_from_slice(&[normal; 3]);
    };

    // Caps as triangle fans.
    for i in 1..outline.len() - 1 {
        let (a, b, c) = (outline[0], outline[i], outline[i + 1]);
        push_triangle(a, c, b, -Vec3::Z);
        push_triangle(
            at_depth(a, PRISM_DEPTH),
            at_depth(b, PRISM_DEPTH),
            at_depth(c, PRISM_DEPTH),
            Vec3::Z,
        );
    }

    for step in 0..steps {
        let z0 = PRISM_DEPTH * step as f32 / steps as f32;
        let z1 = PRISM_DEPTH * (step + 1) as f32 / steps as f32;
        for i in 0..outline.len() {
            let p = outline[i];
            let q = outline[(i + 1) % outline.len()];
            let normal = (p + q).normalize();
            let (p0, q0, p1, q1) = (at_depth(p, z0), at_depth(q, z0), at_depth(p, z1), at_depth(q, z1));
            push_triangle(p0, q0, q1, normal);
            push_triangle(p0, q1, p1, normal);
        }
    }

    MeshBuffers {
        positions,
        normals: Some(normals),
        indices: None,
    }
}

// ── Polyhedra ──

const TETRAHEDRON_VERTICES: [Vec3; 4] = [
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
];
const TETRAHEDRON_INDICES: [usize; 12] = [2, 1, 0, 0, 3, 2, 1, 3, 0, 2, 3, 1];

const OCTAHEDRON_VERTICES: [Vec3; 6] = [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, -1.0),
];
const OCTAHEDRON_INDICES: [usize; 24] = [
    0, 2, 4, 0, 4, 3, 0, 3, 5, 0, 5, 2, 1, 2, 5, 1, 5, 3, 1, 3, 4, 1, 4, 2,
];

const DODECAHEDRON_INDICES: [usize; 108] = [
    3, 11, 7, 3, 7, 15, 3, 15, 13, 7, 19, 17, 7, 17, 6, 7, 6, 15, 17, 4, 8, 17, 8, 10, 17, 10, 6,
    8, 0, 16, 8, 16, 2, 8, 2, 10, 0, 12, 1, 0, 1, 18, 0, 18, 16, 6, 10, 2, 6, 2, 13, 6, 13, 15, 2,
    16, 18, 2, 18, 3, 2, 3, 13, 18, 1, 9, 18, 9, 11, 18, 11, 3, 4, 14, 12, 4, 12, 0, 4, 0, 8, 11, 9,
    5, 11, 5, 19, 11, 19, 7, 19, 5, 14, 19, 14, 4, 19, 4, 17, 1, 12, 14, 1, 14, 5, 1, 5, 9,
];

fn dodecahedron_vertices() -> [Vec3; 20] {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let r = 1.0 / t;
    [
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(0.0, -r, -t),
        Vec3::new(0.0, -r, t),
        Vec3::new(0.0, r, -t),
        Vec3::new(0.0, r, t),
        Vec3::new(-r, -t, 0.0),
        Vec3::new(-r, t, 0.0),
        Vec3::new(r, -t, 0.0),
        Vec3::new(r, t, 0.0),
        Vec3::new(-t, 0.0, -r),
        Vec3::new(t, 0.0, -r),
        Vec3::new(-t, 0.0, r),
        Vec3::new(t, 0.0, r),
    ]
}

/// Subdivides every face `subdivisions` times and projects the result onto a
/// sphere of `radius`. The output is unindexed and has no normals.
fn polyhedron(vertices: &[Vec3], indices: &[usize], radius: f32, subdivisions: u32) -> MeshBuffers {
    let cols = subdivisions as usize + 1;
    let mut positions = Vec::with_capacity(indices.len() * cols * cols);

    for face in indices.chunks_exact(3) {
        let (a, b, c) = (vertices[face[0]], vertices[face[1]], vertices[face[2]]);

        // grid[i][j]: row i walks from edge ab towards c.
        let mut grid: Vec<Vec<Vec3>> = Vec::with_capacity(cols + 1);
        for i in 0..=cols {
            let t = i as f32 / cols as f32;
            let aj = lerp(a, c, t);
            let bj = lerp(b, c, t);
            let rows = cols - i;
            let row = (0..=rows)
                .map(|j| {
                    if j == 0 && i == cols {
                        aj
                    } else {
                        lerp(aj, bj, j as f32 / rows as f32)
                    }
                })
                .collect();
            grid.push(row);
        }

        for i in 0..cols {
            for j in 0..2 * (cols - i) - 1 {
                let k = j / 2;
                let triangle = if j % 2 == 0 {
                    [grid[i][k + 1], grid[i + 1][k], grid[i][k]]
                } else {
                    [grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]
                };
                positions.extend_from_slice(&triangle);
            }
        }
    }

    for position in &mut positions {
        *position = position.normalize() * radius;
    }

    MeshBuffers::from_positions(positions)
}

fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(detail: f32, radius: f32) -> ShapeParams {
        ShapeParams::new(detail, radius)
    }

    #[test]
    fn test_segment_counts_are_clamped() {
        assert_eq!(scaled_segments(32.0, 1.0, 8, 64), 32);
        assert_eq!(scaled_segments(32.0, 0.1, 8, 64), 8);
        assert_eq!(scaled_segments(32.0, 10.0, 8, 64), 64);
        assert_eq!(scaled_segments(6.0, 1.5, 6, 12), 9);
    }

    #[test]
    fn test_polyhedron_subdivisions_round_and_clamp() {
        assert_eq!(polyhedron_subdivisions(0.4), 0);
        assert_eq!(polyhedron_subdivisions(1.5), 2);
        assert_eq!(polyhedron_subdivisions(9.0), MAX_POLYHEDRON_SUBDIVISIONS);
    }

    #[test]
    fn test_sphere_grid_layout() {
        let mesh = build(ShapeKind::Sphere, &params(1.0, 1.0));
        assert_eq!(mesh.positions.len(), 17 * 33);
        // Poles collapse, so each pole row only contributes one triangle per column.
        assert_eq!(mesh.face_count(), 32 * (2 * 16 - 2));
        for p in &mesh.positions {
            assert_relative_eq!(p.length(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_torus_vertices_lie_on_the_tube() {
        let radius = 2.0;
        let mesh = build(ShapeKind::Torus, &params(1.0, radius));
        let tube = radius * TUBE_RATIO;
        for p in &mesh.positions {
            let ring = (p.x * p.x + p.y * p.y).sqrt() - radius;
            assert_relative_eq!((ring * ring + p.z * p.z).sqrt(), tube, epsilon = 1e-4);
        }
        assert_eq!(mesh.face_count(), 16 * 32 * 2);
    }

    #[test]
    fn test_torus_knot_and_ribbon_have_unit_normals() {
        for kind in [ShapeKind::TorusKnot, ShapeKind::Ribbon] {
            let mesh = build(kind, &params(1.0, 0.5));
            let normals = mesh.normals.as_ref().expect("swept tubes carry normals");
            assert_eq!(normals.len(), mesh.positions.len());
            for n in normals {
                assert_relative_eq!(n.length(), 1.0, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_prism_is_unindexed_with_flat_normals() {
        let mesh = build(ShapeKind::HexagonalPrism, &params(1.0, 1.0));
        assert!(mesh.indices.is_none());
        // Two fans of 4 triangles plus 6 walls of 2 triangles for each of 2 steps.
        assert_eq!(mesh.face_count(), 2 * 4 + 6 * 2 * 2);
        assert_eq!(mesh.normals.as_ref().map(Vec::len), Some(mesh.positions.len()));
    }

    #[test]
    fn test_prism_depth_steps_are_capped() {
        // 12 sides: two fans of 10 triangles, then 2 triangles per side per step.
        let faces = |detail: f32| build(ShapeKind::HexagonalPrism, &params(detail, 1.0)).face_count();
        assert_eq!(faces(12.0), 2 * 10 + 12 * 2 * MAX_PRISM_STEPS as usize);
        assert_eq!(faces(5_000.0), faces(12.0));
        assert_eq!(faces(0.0), 2 * 4 + 6 * 2);
    }

    #[test]
    fn test_polyhedra_are_raw_triangle_soup_on_the_sphere() {
        let cases = [
            (ShapeKind::Tetrahedron, 4),
            (ShapeKind::Octahedron, 8),
            (ShapeKind::Dodecahedron, 36),
        ];
        for (kind, base_faces) in cases {
            for detail in [0.0, 1.0, 2.0] {
                let mesh = build(kind, &params(detail, 1.5));
                let cols = detail as usize + 1;
                assert!(mesh.indices.is_none());
                assert!(mesh.normals.is_none());
                assert_eq!(mesh.face_count(), base_faces * cols * cols);
                for p in &mesh.positions {
                    assert_relative_eq!(p.length(), 1.5, epsilon = 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_every_index_is_in_range() {
        for kind in ShapeKind::ALL {
            let mesh = build(kind, &params(1.0, 1.0));
            if let Some(indices) = &mesh.indices {
                assert_eq!(indices.len() % 3, 0);
                assert!(indices.iter().all(|&i| (i as usize) < mesh.positions.len()));
            }
        }
    }
}
