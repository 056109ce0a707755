//! Shared collision models of props.

use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};
use crate::shape::Plane;
use crate::utils::SortedPair;
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;

/// Index of a vertex of a [`SectionTriMesh`].
pub type VertIdx = u16;

/// Indicates an inconsistency while building a collision model section.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum CollisionModelError {
    /// A section cannot index more than `u16::MAX + 1` vertices.
    #[error("a section cannot have more than 65536 vertices, found {0}")]
    TooManyVertices(usize),
    /// A triangle references a vertex that does not exist.
    #[error("triangle {0} references a vertex out of bounds")]
    IndexOutOfBounds(usize),
}

/// The triangle mesh of one convex section of a collision model.
///
/// Triangles are wound clockwise when seen from outside.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct SectionTriMesh {
    vertices: Vec<Point<Real>>,
    edges: Vec<[VertIdx; 2]>,
    tris: Vec<[VertIdx; 3]>,
}

impl SectionTriMesh {
    /// Builds a section from its vertices and clockwise triangles.
    ///
    /// Unique edges are extracted in order of first appearance, keeping the orientation of the
    /// triangle they first appear in.
    pub fn new(
        vertices: Vec<Point<Real>>,
        tris: Vec<[VertIdx; 3]>,
    ) -> Result<Self, CollisionModelError> {
        if vertices.len() > VertIdx::MAX as usize + 1 {
            return Err(CollisionModelError::TooManyVertices(vertices.len()));
        }

        let mut seen = HashSet::with_capacity(tris.len() * 3 / 2);
        let mut edges = Vec::with_capacity(tris.len() * 3 / 2);

        for (tri_id, tri) in tris.iter().enumerate() {
            if tri.iter().any(|v| *v as usize >= vertices.len()) {
                return Err(CollisionModelError::IndexOutOfBounds(tri_id));
            }

            for i in 0..3 {
                let (v1, v2) = (tri[i], tri[(i + 1) % 3]);
                if seen.insert(SortedPair::new(v1, v2)) {
                    edges.push([v1, v2]);
                }
            }
        }

        Ok(Self {
            vertices,
            edges,
            tris,
        })
    }

    /// The vertices of this section.
    #[inline]
    pub fn vertices(&self) -> &[Point<Real>] {
        &self.vertices
    }

    /// The unique edges of this section.
    #[inline]
    pub fn edges(&self) -> &[[VertIdx; 2]] {
        &self.edges
    }

    /// The clockwise triangles of this section.
    #[inline]
    pub fn triangles(&self) -> &[[VertIdx; 3]] {
        &self.tris
    }

    /// The vertices of the `i`-th triangle.
    #[inline]
    pub fn triangle_vertices(&self, i: usize) -> [Point<Real>; 3] {
        let [a, b, c] = self.tris[i];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }
}

/// The outward plane of a clockwise triangle.
pub fn cw_triangle_plane(v1: &Point<Real>, v2: &Point<Real>, v3: &Point<Real>) -> Plane {
    let normal = (v3 - v1).cross(&(v2 - v1)).normalize();
    Plane::new(normal, normal.dot(&v1.coords))
}

/// An immutable collision model made of convex sections, shared by every prop using it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CollisionModel {
    sections: Vec<SectionTriMesh>,
    section_planes: Vec<Vec<Plane>>,
    section_aabbs: Vec<Aabb>,
}

impl CollisionModel {
    /// Builds a collision model, precomputing the plane of every triangle and the local box of
    /// every section.
    pub fn new(sections: Vec<SectionTriMesh>) -> Self {
        let section_planes = sections
            .iter()
            .map(|section| {
                (0..section.triangles().len())
                    .map(|i| {
                        let [v1, v2, v3] = section.triangle_vertices(i);
                        cw_triangle_plane(&v1, &v2, &v3)
                    })
                    .collect()
            })
            .collect();
        let section_aabbs = sections
            .iter()
            .map(|section| Aabb::from_points(section.vertices().iter().copied()))
            .collect();

        Self {
            sections,
            section_planes,
            section_aabbs,
        }
    }

    /// The number of convex sections.
    #[inline]
    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// The triangle mesh of every section.
    #[inline]
    pub fn sections(&self) -> &[SectionTriMesh] {
        &self.sections
    }

    /// The triangle planes of every section, in triangle order.
    #[inline]
    pub fn section_planes(&self) -> &[Vec<Plane>] {
        &self.section_planes
    }

    /// The local-space box of every section.
    #[inline]
    pub fn section_aabbs(&self) -> &[Aabb] {
        &self.section_aabbs
    }
}

/// Collision models keyed by their case-insensitive asset path.
#[derive(Clone, Debug, Default)]
pub struct CollisionModelLibrary {
    models: HashMap<String, Arc<CollisionModel>>,
}

impl CollisionModelLibrary {
    /// An empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the collision model of an asset path, replacing any previous one.
    pub fn insert(&mut self, path: &str, model: impl Into<Arc<CollisionModel>>) {
        let _ = self.models.insert(path.to_lowercase(), model.into());
    }

    /// The collision model of an asset path, if any.
    pub fn get(&self, path: &str) -> Option<&Arc<CollisionModel>> {
        self.models.get(&path.to_lowercase())
    }

    /// The number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Is this library empty?
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
