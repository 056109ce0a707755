use super::disp_coll_tree::{
    DispCollTri, DispCollTree, DISPCOLL_DIST_EPSILON, DISPCOLL_INVALID_FRAC,
};
use super::disp_plane_cache::DispCollCache;
use super::DispFlags;
use crate::bounding_volume::Aabb;
use crate::debug::TraceObserver;
use crate::math::{Point, Real, Vector};
use crate::query::details::pushed_out_plane_dist;
use crate::query::{SweptTrace, TraceInfo};

/// The `[start_frac, end_frac]` interval of a sweep inside the planes tested so far.
struct SweepInterval {
    start_frac: Real,
    end_frac: Real,
    impact_normal: Vector<Real>,
}

impl SweepInterval {
    fn new() -> Self {
        Self {
            start_frac: DISPCOLL_INVALID_FRAC,
            end_frac: 1.0,
            impact_normal: Vector::zeros(),
        }
    }

    /// Narrows the interval with one plane, given the signed distances of the sweep ends.
    ///
    /// Returns `false` if the sweep lies entirely in front of the plane.
    fn clip(&mut self, start: Real, end: Real, normal: Vector<Real>) -> bool {
        if start > 0.0 && end > 0.0 {
            return false;
        }
        if start < 0.0 && end < 0.0 {
            return true;
        }

        let denom = start - end;
        if start >= 0.0 && end <= 0.0 {
            let t = if denom != 0.0 {
                (start - DISPCOLL_DIST_EPSILON) / denom
            } else {
                0.0
            };
            if t > self.start_frac {
                self.start_frac = t;
                self.impact_normal = normal;
            }
        } else {
            let t = if denom != 0.0 {
                (start + DISPCOLL_DIST_EPSILON) / denom
            } else {
                0.0
            };
            if t < self.end_frac {
                self.end_frac = t;
            }
        }

        true
    }
}

impl DispCollTree {
    /// Casts the ray of `trace` against this displacement.
    ///
    /// Box traces degrade to a ray test slightly tolerant along the sweep. With `one_sided`,
    /// triangles are only hit from their front. Returns `true` if the trace fraction was
    /// improved, in which case the plane normal is set too. Displacements flagged
    /// [`DispFlags::NO_RAY_COLL`] are never hit.
    pub fn ray_trace(&self, trace: &mut SweptTrace, one_sided: bool) -> bool {
        if self.has_flags(DispFlags::NO_RAY_COLL) {
            return false;
        }

        let extents = trace.info.extents + Vector::repeat(DISPCOLL_DIST_EPSILON);
        let (list, first_leaf) =
            self.sweep_leaf_list(&trace.info.startpos, &trace.info.invdelta, &extents);

        let mut impact_normal = None;
        for node in &list[first_leaf..] {
            let leaf = *node as usize - self.nodes.len();
            for tri in self.leaves[leaf].tris {
                let tri = &self.tris[tri as usize];
                let [v0, v1, v2] = self.triangle_vertices(tri);
                if let Some(frac) = ray_triangle_fraction(&trace.info, &v0, &v2, &v1, one_sided) {
                    if frac < trace.results.fraction {
                        trace.results.fraction = frac;
                        impact_normal = Some(tri.normal);
                    }
                }
            }
        }

        if let Some(normal) = impact_normal {
            trace.results.plane_normal = normal;
            true
        } else {
            false
        }
    }

    /// Does `aabb` overlap any triangle of this displacement?
    ///
    /// Displacements flagged [`DispFlags::NO_HULL_COLL`] never overlap anything.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        if self.has_flags(DispFlags::NO_HULL_COLL) {
            return false;
        }

        let center = aabb.center();
        let extents = aabb.maxs - center;
        let (list, first_leaf) = self.overlap_leaf_list(aabb);

        list[first_leaf..].iter().any(|node| {
            let leaf = *node as usize - self.nodes.len();
            self.leaves[leaf].tris.iter().any(|tri| {
                let tri = &self.tris[*tri as usize];
                let [v0, v1, v2] = self.triangle_vertices(tri);
                box_intersects_triangle(&center, &extents, [v0, v2, v1], tri, 0.0)
            })
        })
    }

    /// Sweeps the box of `trace` against this displacement.
    ///
    /// Builds the edge plane cache on first use. Returns `true` if the trace fraction was
    /// improved. Displacements flagged [`DispFlags::NO_HULL_COLL`] are never hit.
    pub fn sweep_aabb(&self, trace: &mut SweptTrace, observer: &mut impl TraceObserver) -> bool {
        if self.has_flags(DispFlags::NO_HULL_COLL) {
            return false;
        }

        let initial_fraction = trace.results.fraction;
        let extents = trace.info.extents + Vector::repeat(DISPCOLL_DIST_EPSILON);
        let (list, first_leaf) =
            self.sweep_leaf_list(&trace.info.startpos, &trace.info.invdelta, &extents);

        if first_leaf < list.len() {
            let cache = self.cache();
            for node in &list[first_leaf..] {
                let leaf = *node as usize - self.nodes.len();
                observer.start_disp_leaf(self, leaf);
                for tri in self.leaves[leaf].tris {
                    self.sweep_triangle(trace, tri as usize, cache);
                }
                observer.finish_disp_leaf();
            }
        }

        trace.results.fraction < initial_fraction
    }

    fn sweep_triangle(&self, trace: &mut SweptTrace, tri_idx: usize, cache: &DispCollCache) {
        let tri = &self.tris[tri_idx];
        let info = &trace.info;

        // Moving away from the front of the triangle.
        if tri.normal.dot(&info.delta) > DISPCOLL_DIST_EPSILON {
            return;
        }

        let mut interval = SweepInterval::new();

        if !self.clip_axis_planes(info, tri, &mut interval) {
            return;
        }

        let end = info.startpos + info.delta;
        let plane_refs = &cache.tri_planes[tri_idx];
        for (axis, refs) in plane_refs.iter().enumerate() {
            for plane_ref in refs {
                let Some((normal, dist)) = cache.edge_plane(*plane_ref, axis) else {
                    continue;
                };
                if !clip_plane(&mut interval, info, &end, normal, dist) {
                    return;
                }
            }
        }

        if !clip_plane(&mut interval, info, &end, tri.normal, tri.dist) {
            return;
        }

        let SweepInterval {
            start_frac,
            end_frac,
            impact_normal,
        } = interval;

        if (start_frac < end_frac || (start_frac - end_frac).abs() < 0.001)
            && start_frac != DISPCOLL_INVALID_FRAC
            && start_frac < trace.results.fraction
        {
            trace.results.fraction = start_frac.max(0.0);
            trace.results.plane_normal = impact_normal;
        }
    }

    // The six planes of the triangle's box, z axis first.
    fn clip_axis_planes(
        &self,
        info: &TraceInfo,
        tri: &DispCollTri,
        interval: &mut SweepInterval,
    ) -> bool {
        for axis in (0..3).rev() {
            let start = info.startpos[axis];
            let extent = info.extents[axis];
            let delta = info.delta[axis];
            let mut normal = Vector::zeros();

            let dist = self.verts[tri.vert(tri.min(axis))][axis];
            let d1 = (dist - extent) - start;
            normal[axis] = -1.0;
            if !interval.clip(d1, d1 - delta, normal) {
                return false;
            }

            let dist = self.verts[tri.vert(tri.max(axis))][axis];
            let d1 = start - (dist + extent);
            normal[axis] = 1.0;
            if !interval.clip(d1, d1 + delta, normal) {
                return false;
            }
        }

        true
    }
}

fn clip_plane(
    interval: &mut SweepInterval,
    info: &TraceInfo,
    end: &Point<Real>,
    normal: Vector<Real>,
    dist: Real,
) -> bool {
    let expanded = pushed_out_plane_dist(&normal, dist, &info.extents);
    let d1 = normal.dot(&info.startpos.coords) - expanded;
    let d2 = normal.dot(&end.coords) - expanded;
    interval.clip(d1, d2, normal)
}

// Fraction along the sweep to tolerate for box traces tested as rays.
fn box_offset(info: &TraceInfo) -> Real {
    if info.isray {
        return 1.0e-3;
    }

    let offset = info.extents.component_mul(&info.delta).abs().sum();
    offset / info.delta.norm_squared().max(1.0) + 1.0e-3
}

/// Parametric intersection of the sweep of `info` with the triangle `(v1, v2, v3)`.
///
/// With `one_sided`, triangles are culled unless the sweep moves against the normal
/// `(v2 - v1) x (v3 - v1)`. Returns the fraction, clamped to `[0, 1]`.
pub fn ray_triangle_fraction(
    info: &TraceInfo,
    v1: &Point<Real>,
    v2: &Point<Real>,
    v3: &Point<Real>,
    one_sided: bool,
) -> Option<Real> {
    let edge1 = v2 - v1;
    let edge2 = v3 - v1;

    if one_sided && edge1.cross(&edge2).dot(&info.delta) >= 0.0 {
        return None;
    }

    let dir_cross_edge2 = info.delta.cross(&edge2);
    let denom = dir_cross_edge2.dot(&edge1);
    if denom.abs() < 1.0e-6 {
        return None;
    }
    let denom = 1.0 / denom;

    let org = info.startpos - v1;
    let u = dir_cross_edge2.dot(&org) * denom;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let org_cross_edge1 = org.cross(&edge1);
    let v = org_cross_edge1.dot(&info.delta) * denom;
    if v < 0.0 || v + u > 1.0 {
        return None;
    }

    let box_t = box_offset(info);
    let t = org_cross_edge1.dot(&edge2) * denom;
    if t < -box_t || t > 1.0 + box_t {
        return None;
    }

    Some(t.clamp(0.0, 1.0))
}

/// On which side of the plane of `tri` is the box `(mins, maxs)`?
///
/// Returns 1 if in front, 2 if behind, 3 if crossing the plane.
fn box_on_plane_side(mins: &Point<Real>, maxs: &Point<Real>, tri: &DispCollTri) -> u8 {
    let axis = tri.plane_type as usize;
    if axis < 3 {
        return if tri.dist <= mins[axis] {
            1
        } else if tri.dist >= maxs[axis] {
            2
        } else {
            3
        };
    }

    let (mut dist1, mut dist2) = (0.0, 0.0);
    for i in 0..3 {
        let (near, far) = if tri.sign_bits & (1 << i) != 0 {
            (mins[i], maxs[i])
        } else {
            (maxs[i], mins[i])
        };
        dist1 += tri.normal[i] * near;
        dist2 += tri.normal[i] * far;
    }

    let mut sides = 0;
    if dist1 >= tri.dist {
        sides = 1;
    }
    if dist2 < tri.dist {
        sides |= 2;
    }
    sides
}

// Separating axis test of one edge-cross-axis direction, given the projections of the two
// triangle vertices that bound the triangle along it.
#[inline]
fn overlaps_along(d_a: Real, d_b: Real, box_dist: Real, tolerance: Real) -> bool {
    let (min, max) = if d_a < d_b { (d_a, d_b) } else { (d_b, d_a) };
    !(min > box_dist + tolerance || max < -(box_dist + tolerance))
}

/// Separating axis test between the box `(center, extents)` and the triangle `v`, whose plane
/// is the plane of `tri`.
///
/// Tests the 3 box axes, the 9 crossings of the triangle edges with the box axes, and the
/// triangle plane.
pub(crate) fn box_intersects_triangle(
    center: &Point<Real>,
    extents: &Vector<Real>,
    v: [Point<Real>; 3],
    tri: &DispCollTri,
    tolerance: Real,
) -> bool {
    let p = v.map(|v| v - center);

    for axis in 0..3 {
        let min = p[0][axis].min(p[1][axis]).min(p[2][axis]);
        let max = p[0][axis].max(p[1][axis]).max(p[2][axis]);
        if min > extents[axis] + tolerance || max < -(extents[axis] + tolerance) {
            return false;
        }
    }

    // Edge i goes from p[i] to p[i + 1]. Along each crossed axis, the triangle projects between
    // one vertex of the edge and the opposite vertex.
    const BOUNDING_VERTS: [[(usize, usize); 3]; 3] = [
        [(0, 2), (0, 2), (1, 2)],
        [(0, 1), (0, 1), (0, 2)],
        [(0, 1), (0, 1), (1, 2)],
    ];

    for (i, [vx, vy, vz]) in BOUNDING_VERTS.iter().enumerate() {
        let e = p[(i + 1) % 3] - p[i];
        let a = e.abs();

        // Axis x cross edge: (0, e.z, -e.y).
        let dist_x = |q: usize| e.z * p[q].y - e.y * p[q].z;
        let box_x = a.z * extents.y + a.y * extents.z;
        if !overlaps_along(dist_x(vx.0), dist_x(vx.1), box_x, tolerance) {
            return false;
        }

        // Axis y cross edge: (-e.z, 0, e.x).
        let dist_y = |q: usize| -e.z * p[q].x + e.x * p[q].z;
        let box_y = a.z * extents.x + a.x * extents.z;
        if !overlaps_along(dist_y(vy.0), dist_y(vy.1), box_y, tolerance) {
            return false;
        }

        // Axis z cross edge: (e.y, -e.x, 0).
        let dist_z = |q: usize| e.y * p[q].x - e.x * p[q].y;
        let box_z = a.y * extents.x + a.x * extents.y;
        if !overlaps_along(dist_z(vz.0), dist_z(vz.1), box_z, tolerance) {
            return false;
        }
    }

    box_on_plane_side(&(center - extents), &(center + extents), tri) == 3
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::debug::NoopObserver;
    use crate::shape::displacement::disp_coll_tree::test_utils::{flat, terrain};

    fn sweep(tree: &DispCollTree, trace: &mut SweptTrace) -> bool {
        tree.sweep_aabb(trace, &mut NoopObserver)
    }

    #[test]
    fn flat_patch_stops_descending_box() {
        // 5 x 5 vertices spanning [0, 64] at z = 0.
        let tree = flat(2, 64.0);
        let mut trace = SweptTrace::new_hull(
            Point::new(32.0, 32.0, 100.0),
            Point::new(32.0, 32.0, -10.0),
            Vector::new(-16.0, -16.0, 0.0),
            Vector::new(16.0, 16.0, 72.0),
        );

        assert!(sweep(&tree, &mut trace));
        assert_relative_eq!(
            trace.results.fraction,
            (100.0 - DISPCOLL_DIST_EPSILON) / 110.0,
            epsilon = 1.0e-5
        );
        assert_relative_eq!(trace.results.plane_normal, Vector::z(), epsilon = 1.0e-5);
        assert!(!trace.results.startsolid);
    }

    #[test]
    fn box_moving_away_misses() {
        let tree = flat(2, 64.0);
        let mut trace = SweptTrace::new_hull(
            Point::new(32.0, 32.0, 10.0),
            Point::new(32.0, 32.0, 100.0),
            Vector::new(-16.0, -16.0, 0.0),
            Vector::new(16.0, 16.0, 72.0),
        );
        assert!(!sweep(&tree, &mut trace));
        assert_eq!(trace.results.fraction, 1.0);
    }

    #[test]
    fn box_passing_beside_misses() {
        let tree = flat(2, 64.0);
        let mut trace = SweptTrace::new_hull(
            Point::new(200.0, 32.0, 100.0),
            Point::new(200.0, 32.0, -10.0),
            Vector::new(-16.0, -16.0, 0.0),
            Vector::new(16.0, 16.0, 72.0),
        );
        assert!(!sweep(&tree, &mut trace));
        assert!(!tree.is_cached());
    }

    #[test]
    fn sloped_patch_normal() {
        // z = x / 2 + y / 4, the upward normal is (-2, -1, 4) / sqrt(21).
        let tree = terrain(3, Point::origin(), 128.0, |x, y| x * 0.5 + y * 0.25);
        let mut trace = SweptTrace::new_hull(
            Point::new(66.0, 56.0, 200.0),
            Point::new(66.0, 56.0, 0.0),
            Vector::new(-4.0, -4.0, -4.0),
            Vector::new(4.0, 4.0, 4.0),
        );
        assert!(sweep(&tree, &mut trace));

        let expected = Vector::new(-2.0, -1.0, 4.0).normalize();
        assert_relative_eq!(trace.results.plane_normal, expected, epsilon = 1.0e-4);
        // Only the uphill corner (70, 60) touches the slope, inside a triangle, at z - 4 = 50.
        let z = 200.0 - trace.results.fraction * 200.0;
        assert_relative_eq!(z, 54.0, epsilon = 0.1);
    }

    #[test]
    fn no_hull_coll_flag() {
        let verts = flat(2, 64.0).verts;
        let tree = DispCollTree::from_vertices(2, DispFlags::NO_HULL_COLL, verts);
        let mut trace = SweptTrace::new_hull(
            Point::new(32.0, 32.0, 100.0),
            Point::new(32.0, 32.0, -10.0),
            Vector::new(-16.0, -16.0, 0.0),
            Vector::new(16.0, 16.0, 72.0),
        );
        assert!(!sweep(&tree, &mut trace));
        assert!(!tree.intersects_aabb(&Aabb::new(
            Point::new(0.0, 0.0, -1.0),
            Point::new(64.0, 64.0, 1.0)
        )));
    }

    #[test]
    fn ray_hits_front_only() {
        let tree = flat(2, 64.0);

        let mut trace = SweptTrace::new_ray(
            Point::new(10.0, 20.0, 50.0),
            Point::new(10.0, 20.0, -50.0),
        );
        assert!(tree.ray_trace(&mut trace, true));
        assert_relative_eq!(trace.results.fraction, 0.5, epsilon = 1.0e-6);
        assert_relative_eq!(trace.results.plane_normal, Vector::z(), epsilon = 1.0e-6);

        let mut trace = SweptTrace::new_ray(
            Point::new(10.0, 20.0, -50.0),
            Point::new(10.0, 20.0, 50.0),
        );
        assert!(!tree.ray_trace(&mut trace, true));
        assert!(tree.ray_trace(&mut trace, false));
        assert_relative_eq!(trace.results.fraction, 0.5, epsilon = 1.0e-6);
    }

    #[test]
    fn aabb_overlap() {
        let tree = flat(2, 64.0);
        let hit = Aabb::new(Point::new(10.0, 10.0, -1.0), Point::new(20.0, 20.0, 1.0));
        let above = Aabb::new(Point::new(10.0, 10.0, 1.0), Point::new(20.0, 20.0, 3.0));
        let beside = Aabb::new(Point::new(70.0, 10.0, -1.0), Point::new(80.0, 20.0, 1.0));
        assert!(tree.intersects_aabb(&hit));
        assert!(!tree.intersects_aabb(&above));
        assert!(!tree.intersects_aabb(&beside));
    }

    #[test]
    fn aabb_overlap_matches_ray_probes() {
        // Boxes straddling a bumpy surface overlap it, boxes well above it do not.
        let tree = terrain(3, Point::origin(), 128.0, |x, y| (x * 0.05).sin() * 10.0 + y * 0.1);
        let mut rng = oorandom::Rand32::new(42);

        for _ in 0..200 {
            let x = 8.0 + rng.rand_float() * 112.0;
            let y = 8.0 + rng.rand_float() * 112.0;
            let mut probe = SweptTrace::new_ray(Point::new(x, y, 100.0), Point::new(x, y, -100.0));
            assert!(tree.ray_trace(&mut probe, true));
            let z = 100.0 - probe.results.fraction * 200.0;

            let straddling = Aabb::new(
                Point::new(x - 1.0, y - 1.0, z - 1.0),
                Point::new(x + 1.0, y + 1.0, z + 1.0),
            );
            assert!(tree.intersects_aabb(&straddling));

            let above = Aabb::new(
                Point::new(x - 1.0, y - 1.0, 40.0),
                Point::new(x + 1.0, y + 1.0, 50.0),
            );
            assert!(!tree.intersects_aabb(&above));
        }
    }

    #[test]
    fn ray_fraction_is_clamped() {
        let info = SweptTrace::new_ray(
            Point::new(0.25, 0.25, 0.0),
            Point::new(0.25, 0.25, -1.0),
        ).info;
        let t = ray_triangle_fraction(
            &info,
            &Point::new(0.0, 0.0, 0.0),
            &Point::new(1.0, 0.0, 0.0),
            &Point::new(0.0, 1.0, 0.0),
            true,
        );
        assert_eq!(t, Some(0.0));
    }
}
