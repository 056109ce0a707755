use super::CollisionCache;
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Point, Real, Vector};
use crate::query::details::SweptClip;
use crate::query::SweptTrace;
use crate::shape::{CollisionModel, Plane};

/// Margin added around section boxes before the early-out sweep test.
const SECTION_AABB_BLOAT: Real = 1.0;

/// Sweeps `trace` against a static or dynamic prop placed at `origin`.
///
/// The trace is brought into the local space of the collision model, where every convex
/// section is clipped independently. Ray traces only clip against triangle planes. Hull traces
/// first clip against the section's local box, then against its world box expressed in local
/// space, then against its edge bevels and finally its triangles. The box of a hull trace is
/// rotated along with the trace, so plane distances are pushed out along the rotated axes.
///
/// Hits commit the fraction and the plane normal rotated back to world space. The surface is
/// left untouched.
pub fn swept_trace_xprop(
    trace: &mut SweptTrace,
    origin: &Vector<Real>,
    model: &CollisionModel,
    cache: &CollisionCache,
) {
    let inv_rot = cache.inv_rotation();
    let inv_scale = cache.inv_scale();

    let start: Point<Real> = (inv_rot * (trace.info.startpos.coords - origin) * inv_scale).into();
    let end = start + inv_rot * trace.info.delta * inv_scale;
    let extents = trace.info.extents * inv_scale;

    // World axes, seen from the local space.
    let axes = [
        inv_rot * Vector::x(),
        inv_rot * Vector::y(),
        inv_rot * Vector::z(),
    ];

    let sections = model
        .sections()
        .iter()
        .zip(model.section_planes())
        .zip(model.section_aabbs())
        .zip(cache.section_aabbs().iter().zip(cache.section_bevel_luts()));

    for (((section, tri_planes), local_aabb), (world_aabb, bevel_lut)) in sections {
        let bloated = world_aabb.loosened(SECTION_AABB_BLOAT);
        if trace
            .hits_aabb_on_full_sweep(&bloated.mins, &bloated.maxs)
            .is_none()
        {
            continue;
        }

        let clip = if trace.info.isray {
            clip_section(&start, &end, tri_planes.iter().copied(), |plane| plane.dist)
        } else {
            let planes = local_aabb_planes(local_aabb)
                .into_iter()
                .chain(world_aabb_planes(world_aabb, origin, &axes, inv_scale))
                .chain(bevel_lut.planes(section, inv_rot))
                .chain(tri_planes.iter().copied());
            clip_section(&start, &end, planes, |plane| {
                pushed_out_rotated_plane_dist(plane, &axes, &extents)
            })
        };

        let Some(clip) = clip else {
            continue;
        };

        if let Some((fraction, normal)) = clip.finish(&mut trace.results) {
            trace.results.fraction = fraction;
            trace.results.plane_normal = inv_rot.inverse() * normal;
        }
    }
}

/// Clips the segment against the planes, or returns `None` as soon as it lies entirely in front
/// of one of them.
fn clip_section(
    start: &Point<Real>,
    end: &Point<Real>,
    planes: impl IntoIterator<Item = Plane>,
    plane_dist: impl Fn(&Plane) -> Real,
) -> Option<SweptClip<Vector<Real>>> {
    let mut clip = SweptClip::new();

    for plane in planes {
        let dist = plane_dist(&plane);
        let d1 = start.coords.dot(&plane.normal) - dist;
        let d2 = end.coords.dot(&plane.normal) - dist;

        if !clip.clip(d1, d2, || plane.normal) {
            return None;
        }
    }

    Some(clip)
}

/// Like [`crate::query::details::pushed_out_plane_dist`], for a box whose axes are `axes`.
fn pushed_out_rotated_plane_dist(
    plane: &Plane,
    axes: &[Vector<Real>; 3],
    extents: &Vector<Real>,
) -> Real {
    let offset: Vector<Real> = (0..3)
        .map(|i| {
            let ofs = if axes[i].dot(&plane.normal) < 0.0 {
                extents[i]
            } else {
                -extents[i]
            };
            axes[i] * ofs
        })
        .sum();
    plane.dist - offset.dot(&plane.normal)
}

fn local_aabb_planes(aabb: &Aabb) -> [Plane; 6] {
    [
        Plane::new(Vector::x(), aabb.maxs.x),
        Plane::new(-Vector::x(), -aabb.mins.x),
        Plane::new(Vector::y(), aabb.maxs.y),
        Plane::new(-Vector::y(), -aabb.mins.y),
        Plane::new(Vector::z(), aabb.maxs.z),
        Plane::new(-Vector::z(), -aabb.mins.z),
    ]
}

fn world_aabb_planes(
    aabb: &Aabb,
    origin: &Vector<Real>,
    axes: &[Vector<Real>; 3],
    inv_scale: Real,
) -> [Plane; 6] {
    let maxs = (aabb.maxs.coords - origin) * inv_scale;
    let mins = (aabb.mins.coords - origin) * inv_scale;
    [
        Plane::new(axes[0], maxs.x),
        Plane::new(-axes[0], -mins.x),
        Plane::new(axes[1], maxs.y),
        Plane::new(-axes[1], -mins.y),
        Plane::new(axes[2], maxs.z),
        Plane::new(-axes[2], -mins.z),
    ]
}
