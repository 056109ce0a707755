use crate::math::{Real, Vector};
use crate::query::{TraceResults, DIST_EPSILON, NEVER_UPDATED};

/// Distance of a plane pushed out by the box extents facing away from its normal.
///
/// For a box of half-extents `extents`, the box corner most "behind" the plane is offset by
/// `+extents[i]` where the normal is negative and `-extents[i]` otherwise. Sweeping the box
/// against the plane is then equivalent to sweeping its center against the pushed-out plane.
#[inline]
pub fn pushed_out_plane_dist(normal: &Vector<Real>, dist: Real, extents: &Vector<Real>) -> Real {
    let ofs = Vector::new(
        if normal.x < 0.0 { extents.x } else { -extents.x },
        if normal.y < 0.0 { extents.y } else { -extents.y },
        if normal.z < 0.0 { extents.z } else { -extents.z },
    );
    dist - ofs.dot(normal)
}

/// Incremental clipping of a sweep against the half-spaces bounding a convex region.
///
/// Feed every plane with [`SweptClip::clip`]; stop as soon as it returns `false` (the sweep
/// lies entirely in front of one plane and misses the region). Then call
/// [`SweptClip::finish`].
///
/// `T` identifies the plane leading the entry, typically its normal or brush side.
#[derive(Copy, Clone, Debug)]
pub struct SweptClip<T> {
    enter_frac: Real,
    leave_frac: Real,
    get_out: bool,
    start_out: bool,
    lead: Option<T>,
}

impl<T> Default for SweptClip<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SweptClip<T> {
    /// A clip that crossed no plane yet.
    pub fn new() -> Self {
        Self {
            enter_frac: NEVER_UPDATED,
            leave_frac: 1.0,
            get_out: false,
            start_out: false,
            lead: None,
        }
    }

    /// Clips against one plane given the signed distances `d1` and `d2` of the sweep start and
    /// end to the (pushed-out) plane.
    ///
    /// Returns `false` if both ends are in front of the plane, i.e., the region is missed.
    #[inline]
    pub fn clip(&mut self, d1: Real, d2: Real, lead: impl FnOnce() -> T) -> bool {
        if d1 > 0.0 && d2 > 0.0 {
            return false;
        }

        if d2 > 0.0 {
            self.get_out = true;
        }
        if d1 > 0.0 {
            self.start_out = true;
        }

        if d1 <= 0.0 && d2 <= 0.0 {
            return true;
        }

        if d1 > d2 {
            // Enter.
            let f = (d1 - DIST_EPSILON) / (d1 - d2);
            if f > self.enter_frac {
                self.enter_frac = f;
                self.lead = Some(lead());
            }
        } else {
            // Leave.
            let f = (d1 + DIST_EPSILON) / (d1 - d2);
            if f < self.leave_frac {
                self.leave_frac = f;
            }
        }

        true
    }

    /// Resolves the clip against the current trace results.
    ///
    /// Flags `startsolid` (and `allsolid` if the sweep never leaves the region) when the start is
    /// inside every plane. Otherwise returns the entry fraction, clamped to be non-negative, and
    /// the leading plane if they improve on `results.fraction`. The caller commits them.
    pub fn finish(self, results: &mut TraceResults) -> Option<(Real, T)> {
        if !self.start_out {
            results.startsolid = true;
            if !self.get_out {
                results.allsolid = true;
            }
            return None;
        }

        if self.enter_frac < self.leave_frac
            && self.enter_frac > NEVER_UPDATED
            && self.enter_frac < results.fraction
        {
            let lead = self.lead?;
            Some((self.enter_frac.max(0.0), lead))
        } else {
            None
        }
    }
}
