//! Edge bevel planes of prop sections.
//!
//! Hull traces against a convex section need extra planes along its slanted edges, otherwise
//! the box corners would sink into the section near those edges. Every unique edge yields six
//! candidate planes (one per signed axis), most of which are redundant. Finding the valid ones
//! is expensive and storing the planes themselves would cost megabytes over a whole map, so
//! only the indices of the valid candidates are kept, as 8-bit index steps.

use crate::math::{Matrix, Real, Rotation, Vector};
use crate::shape::{Plane, SectionTriMesh};
use crate::utils;

const STEP_MAX: u8 = u8::MAX;
const RENDER_NORMAL_EPSILON: Real = 0.00001;
const BEVEL_NORMAL_EPSILON: Real = 0.01;
const BEVEL_DIST_EPSILON: Real = 0.01;
const OUTER_HULL_TOLERANCE: Real = 0.1;

/// A candidate bevel plane: the plane containing a section edge and orthogonal to a signed
/// axis of the world.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BevelCandidate {
    /// Index of the edge in [`SectionTriMesh::edges`].
    pub edge: usize,
    /// World axis, `0..3`.
    pub axis: usize,
    /// `1` or `-1`.
    pub dir: i8,
}

impl BevelCandidate {
    /// The deterministic index of this candidate.
    #[inline]
    pub fn index(&self) -> usize {
        self.edge * 6 + self.axis * 2 + if self.dir == 1 { 0 } else { 1 }
    }

    /// The candidate of the given index.
    #[inline]
    pub fn from_index(idx: usize) -> Self {
        Self {
            edge: idx / 6,
            axis: (idx / 2) % 3,
            dir: if idx % 2 == 0 { 1 } else { -1 },
        }
    }
}

/// The valid bevel candidates of one prop section.
///
/// Sorted candidate indices are stored as the steps between consecutive indices. Steps of 255
/// or more are split into runs of 255 followed by the remainder, so every stored value fits in
/// a byte.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BevelPlaneLut {
    steps: Vec<u8>,
}

impl BevelPlaneLut {
    /// Finds the valid bevel candidates of a section placed with the given transform.
    ///
    /// `rotation_scaling` is the upper-left block of the prop's model matrix. `tri_planes` are
    /// the local triangle planes of `mesh`. A candidate is valid if it isn't axial, if no vertex
    /// of the section lies in front of it, and if it doesn't duplicate a triangle plane or an
    /// already accepted bevel.
    pub fn new(
        rotation_scaling: &Matrix<Real>,
        inv_rotation: &Rotation<Real>,
        inv_scale: Real,
        mesh: &SectionTriMesh,
        tri_planes: &[Plane],
    ) -> Self {
        let mut valid_indices = Vec::new();
        let mut valid_planes: Vec<Plane> = Vec::new();

        for (edge_id, [e0, e1]) in mesh.edges().iter().enumerate() {
            let v1 = rotation_scaling * mesh.vertices()[*e0 as usize].coords;
            let v2 = rotation_scaling * mesh.vertices()[*e1 as usize].coords;

            let mut vec = v1 - v2;
            if utils::normalize_in_place(&mut vec) < 0.5 {
                continue;
            }
            let _ = snap_vector(&mut vec);
            if vec.iter().any(|c| *c == 1.0 || *c == -1.0) {
                // Axial edge.
                continue;
            }

            for axis in 0..3 {
                for dir in [-1i8, 1] {
                    let mut vec2 = Vector::zeros();
                    vec2[axis] = dir as Real;
                    let mut normal = vec.cross(&vec2);
                    if utils::normalize_in_place(&mut normal) < 0.5 {
                        continue;
                    }
                    let dist = v1.dot(&normal);

                    if is_near_axial(&normal) {
                        continue;
                    }

                    let final_normal = inv_rotation * normal;
                    let final_dist = dist * inv_scale;

                    let outside_hull = mesh
                        .vertices()
                        .iter()
                        .any(|v| v.coords.dot(&final_normal) - final_dist > OUTER_HULL_TOLERANCE);
                    if outside_hull {
                        continue;
                    }

                    let duplicate = tri_planes
                        .iter()
                        .chain(valid_planes.iter())
                        .any(|p| bevel_plane_equal(p, &final_normal, final_dist));
                    if duplicate {
                        continue;
                    }

                    valid_indices.push(BevelCandidate { edge: edge_id, axis, dir }.index());
                    valid_planes.push(Plane::new(final_normal, final_dist));
                }
            }
        }

        Self::from_candidate_indices(valid_indices)
    }

    /// Encodes a set of candidate indices, in any order.
    pub fn from_candidate_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();

        let mut steps = Vec::with_capacity(indices.len() + indices.len() / 5);
        let mut last = 0;
        for idx in indices {
            let mut step = idx - last;
            while step >= STEP_MAX as usize {
                steps.push(STEP_MAX);
                step -= STEP_MAX as usize;
            }
            steps.push(step as u8);
            last = idx;
        }
        steps.shrink_to_fit();

        Self { steps }
    }

    /// The valid candidate indices, in ascending order.
    pub fn candidate_indices(&self) -> CandidateIndices<'_> {
        CandidateIndices {
            steps: self.steps.iter(),
            current: 0,
        }
    }

    /// The valid bevel planes of `mesh`, in the local space of the collision model.
    ///
    /// `mesh` and `inv_rotation` must be the ones this table was built with.
    pub fn planes<'a>(
        &'a self,
        mesh: &'a SectionTriMesh,
        inv_rotation: &'a Rotation<Real>,
    ) -> BevelPlanes<'a> {
        BevelPlanes {
            indices: self.candidate_indices(),
            mesh,
            inv_rotation,
        }
    }

    /// Number of stored bytes.
    #[inline]
    pub fn memory_size(&self) -> usize {
        self.steps.len() * std::mem::size_of::<u8>()
    }
}

/// Iterator over the candidate indices of a [`BevelPlaneLut`].
#[derive(Clone, Debug)]
pub struct CandidateIndices<'a> {
    steps: std::slice::Iter<'a, u8>,
    current: usize,
}

impl Iterator for CandidateIndices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            let step = *self.steps.next()?;
            self.current += step as usize;
            if step < STEP_MAX {
                return Some(self.current);
            }
        }
    }
}

/// Generates the bevel planes of a section on demand, see [`BevelPlaneLut::planes`].
#[derive(Clone, Debug)]
pub struct BevelPlanes<'a> {
    indices: CandidateIndices<'a>,
    mesh: &'a SectionTriMesh,
    inv_rotation: &'a Rotation<Real>,
}

impl Iterator for BevelPlanes<'_> {
    type Item = Plane;

    fn next(&mut self) -> Option<Plane> {
        let candidate = BevelCandidate::from_index(self.indices.next()?);
        let [e0, e1] = *self.mesh.edges().get(candidate.edge)?;
        let v1 = self.mesh.vertices()[e0 as usize];
        let v2 = self.mesh.vertices()[e1 as usize];

        // Same plane as during validation, built directly in local space.
        let mut axial = Vector::zeros();
        axial[candidate.axis] = candidate.dir as Real;
        let axial = self.inv_rotation * axial;

        let normal = utils::normalized_or_zero(&(v1 - v2).cross(&axial));
        Some(Plane::new(normal, v1.coords.dot(&normal)))
    }
}

/// Snaps a unit vector onto an axis if one of its components is within `1.0e-5` of `±1`.
///
/// Returns `true` if the vector was snapped.
pub fn snap_vector(normal: &mut Vector<Real>) -> bool {
    for i in 0..3 {
        for sign in [1.0, -1.0] {
            if (normal[i] - sign).abs() < RENDER_NORMAL_EPSILON {
                *normal = Vector::zeros();
                normal[i] = sign;
                return true;
            }
        }
    }
    false
}

/// Are the planes equal within the given tolerances?
#[inline]
pub fn plane_equal(
    plane: &Plane,
    normal: &Vector<Real>,
    dist: Real,
    normal_epsilon: Real,
    dist_epsilon: Real,
) -> bool {
    (plane.normal - normal).iter().all(|c| c.abs() < normal_epsilon)
        && (plane.dist - dist).abs() < dist_epsilon
}

#[inline]
fn bevel_plane_equal(plane: &Plane, normal: &Vector<Real>, dist: Real) -> bool {
    plane_equal(plane, normal, dist, BEVEL_NORMAL_EPSILON, BEVEL_DIST_EPSILON)
}

fn is_near_axial(normal: &Vector<Real>) -> bool {
    (0..3).any(|axis| {
        [1.0, -1.0].into_iter().any(|sign| {
            let mut axial = Vector::zeros();
            axial[axis] = sign;
            (normal - axial).iter().all(|c| c.abs() < BEVEL_NORMAL_EPSILON)
        })
    })
}
