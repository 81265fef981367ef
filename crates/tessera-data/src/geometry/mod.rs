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

//! Shape descriptions, mesh buffers and the geometry error type.

mod cache;
pub mod optimize;
mod shared;
pub mod shapes;

pub use cache::{
    format_bytes, CacheReport, CacheReportEntry, CacheStats, GeometryCache, GeometryCacheEntry,
    GeometryHandle,
};
pub use shared::SharedGeometryCache;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tessera_core::math::Vec3;

/// CPU-side mesh data in struct-of-arrays layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Per-vertex normals, parallel to `positions` when present.
    pub normals: Option<Vec<Vec3>>,
    /// Triangle-list indices into `positions`.
    pub indices: Option<Vec<u32>>,
}

impl MeshBuffers {
    /// Creates an unindexed mesh without normals.
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            normals: None,
            indices: None,
        }
    }

    /// Number of vertices in the position buffer.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles: index count / 3, or vertex count / 3 if unindexed.
    pub fn face_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    /// Sum of the byte lengths of every buffer.
    pub fn byte_size(&self) -> usize {
        let positions: &[u8] = bytemuck::cast_slice(&self.positions);
        let normals = self
            .normals
            .as_deref()
            .map_or(0, |n| bytemuck::cast_slice::<Vec3, u8>(n).len());
        let indices = self
            .indices
            .as_deref()
            .map_or(0, |i| bytemuck::cast_slice::<u32, u8>(i).len());
        positions.len() + normals + indices
    }
}

/// The catalogue of procedural shapes the cache can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// UV sphere.
    Sphere,
    /// Ring torus with a tube radius of 0.3 × radius.
    Torus,
    /// (2, 3) torus knot.
    TorusKnot,
    /// Six-to-twelve sided prism extruded along +Z.
    HexagonalPrism,
    /// Subdivided tetrahedron projected on a sphere.
    Tetrahedron,
    /// Subdivided octahedron projected on a sphere.
    Octahedron,
    /// Subdivided dodecahedron projected on a sphere.
    Dodecahedron,
    /// Tube swept along a closed figure-eight curve.
    Ribbon,
}

impl ShapeKind {
    /// Every supported shape.
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::Sphere,
        ShapeKind::Torus,
        ShapeKind::TorusKnot,
        ShapeKind::HexagonalPrism,
        ShapeKind::Tetrahedron,
        ShapeKind::Octahedron,
        ShapeKind::Dodecahedron,
        ShapeKind::Ribbon,
    ];

    /// The stable name used in cache keys and for lookup by name.
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Sphere => "sphere",
            ShapeKind::Torus => "torus",
            ShapeKind::TorusKnot => "torus_knot",
            ShapeKind::HexagonalPrism => "hexagonal_prism",
            ShapeKind::Tetrahedron => "tetrahedron",
            ShapeKind::Octahedron => "octahedron",
            ShapeKind::Dodecahedron => "dodecahedron",
            ShapeKind::Ribbon => "ribbon",
        }
    }

    /// Whether this shape is a subdivided platonic solid, whose subdivision
    /// level is an integer.
    pub fn is_polyhedron(self) -> bool {
        matches!(
            self,
            ShapeKind::Tetrahedron | ShapeKind::Octahedron | ShapeKind::Dodecahedron
        )
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GeometryError::UnknownShape(s.to_string()))
    }
}

/// Cache keys keep this many steps per unit, i.e. 4 decimal places.
const KEY_PRECISION: f32 = 10_000.0;

/// Parameters that affect a shape's topology.
///
/// Appearance (color, material, opacity) is deliberately absent: it belongs
/// to the render host and must never split the cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapeParams {
    /// Scales segment and subdivision counts. `1.0` is the reference detail.
    pub detail: f32,
    /// Overall radius of the shape.
    pub radius: f32,
}

impl ShapeParams {
    /// Creates a parameter set.
    pub const fn new(detail: f32, radius: f32) -> Self {
        Self { detail, radius }
    }

    /// Rejects values that would produce malformed geometry.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.detail.is_finite() || self.detail < 0.0 {
            return Err(GeometryError::InvalidParameter {
                name: "detail",
                value: self.detail,
            });
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(GeometryError::InvalidParameter {
                name: "radius",
                value: self.radius,
            });
        }
        Ok(())
    }

    /// Snaps the parameters to the precision of the cache key.
    ///
    /// Both values are rounded to 4 decimal places. Polyhedra only honor
    /// integer subdivision levels, so their detail becomes that level. Two
    /// parameter sets with the same key quantize to the same value, and the
    /// cache builds from the quantized value only.
    pub fn quantized(&self, kind: ShapeKind) -> Self {
        let detail = if kind.is_polyhedron() {
            shapes::polyhedron_subdivisions(self.detail) as f32
        } else {
            round_to_key_precision(self.detail)
        };
        // `+ 0.0` folds a negative zero into positive zero.
        Self::new(detail + 0.0, round_to_key_precision(self.radius) + 0.0)
    }

    /// Builds the cache key for `kind` with these parameters.
    pub fn cache_key(&self, kind: ShapeKind) -> String {
        let ShapeParams { detail, radius } = self.quantized(kind);
        format!("{}_d{:.4}_r{:.4}", kind.as_str(), detail, radius)
    }
}

fn round_to_key_precision(value: f32) -> f32 {
    let scaled = value * KEY_PRECISION;
    if scaled.is_finite() {
        scaled.round() / KEY_PRECISION
    } else {
        value
    }
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// Errors raised by the geometry cache.
///
/// These are programmer errors: there is no safe default shape to fall back
/// on, so they always reach the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The requested shape name is not part of the catalogue.
    UnknownShape(String),
    /// A shape parameter is out of its valid domain.
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// The builder produced no vertices.
    EmptyMesh(ShapeKind),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::UnknownShape(name) => write!(f, "Unknown shape kind '{name}'"),
            GeometryError::InvalidParameter { name, value } => {
                write!(f, "Invalid shape parameter '{name}': {value}")
            }
            GeometryError::EmptyMesh(kind) => {
                write!(f, "Shape '{kind}' produced an empty mesh")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_kind_round_trips_through_name() {
        for kind in ShapeKind::ALL {
            assert_eq!(kind.as_str().parse::<ShapeKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_shape_name_is_rejected() {
        assert_eq!(
            "cube".parse::<ShapeKind>(),
            Err(GeometryError::UnknownShape("cube".into()))
        );
    }

    #[test]
    fn test_cache_key_depends_on_topology_parameters() {
        let a = ShapeParams::new(1.0, 1.0).cache_key(ShapeKind::Sphere);
        let b = ShapeParams::new(2.0, 1.0).cache_key(ShapeKind::Sphere);
        let c = ShapeParams::new(1.0, 1.0).cache_key(ShapeKind::Torus);
        assert_eq!(a, "sphere_d1.0000_r1.0000");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_cache_key_rounds_polyhedron_detail() {
        let a = ShapeParams::new(0.2, 1.0).cache_key(ShapeKind::Octahedron);
        let b = ShapeParams::new(0.0, 1.0).cache_key(ShapeKind::Octahedron);
        assert_eq!(a, b);
    }

    #[test]
    fn test_quantized_params_match_their_key() {
        let raw = ShapeParams::new(1.999_96, 0.750_04);
        let snapped = raw.quantized(ShapeKind::TorusKnot);
        assert_eq!(snapped, ShapeParams::new(2.0, 0.75));
        assert_eq!(snapped.cache_key(ShapeKind::TorusKnot), raw.cache_key(ShapeKind::TorusKnot));
        assert_eq!(ShapeParams::new(1.6, 1.0).quantized(ShapeKind::Tetrahedron).detail, 2.0);
    }

    #[test]
    fn test_cache_key_folds_negative_zero() {
        let key = ShapeParams::new(-0.0, 1.0).cache_key(ShapeKind::Sphere);
        assert_eq!(key, "sphere_d0.0000_r1.0000");
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert!(ShapeParams::new(1.0, 0.0).validate().is_err());
        assert!(ShapeParams::new(f32::NAN, 1.0).validate().is_err());
        assert!(ShapeParams::new(-1.0, 1.0).validate().is_err());
        assert!(ShapeParams::new(1.0, f32::INFINITY).validate().is_err());
        assert!(ShapeParams::new(0.0, 0.5).validate().is_ok());
    }

    #[test]
    fn test_mesh_byte_size_counts_every_buffer() {
        let mesh = MeshBuffers {
            positions: vec![Vec3::ZERO; 3],
            normals: Some(vec![Vec3::Z; 3]),
            indices: Some(vec![0, 1, 2]),
        };
        assert_eq!(mesh.byte_size(), 36 + 36 + 12);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(MeshBuffers::from_positions(vec![Vec3::ZERO; 6]).face_count(), 2);
    }
}
