//! The swept trace value type shared by every narrow-phase.

use crate::bounding_volume::swept_box_hits_aabb;
use crate::math::{Point, Real, Vector};

/// Distance epsilon used by plane clipping: 1/32 unit, to keep floating point happy.
pub const DIST_EPSILON: Real = 0.03125;

/// Sentinel entry fraction of a clip that never crossed a plane front-to-back.
pub const NEVER_UPDATED: Real = -9999.0;

/// Computes `1 / delta` component-wise, mapping zero components to `Real::MAX`.
///
/// Zero components must not map to infinity: some legacy slab tests rely on
/// `0 * Real::MAX == 0`.
#[inline]
pub fn inverse_delta(delta: &Vector<Real>) -> Vector<Real> {
    delta.map(|x| if x != 0.0 { 1.0 / x } else { Real::MAX })
}

/// The immutable description of a swept trace.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct TraceInfo {
    /// Starting point, centered within the extents.
    pub startpos: Point<Real>,
    /// Add this to `startpos` to get the actual, uncentered start.
    pub startoffset: Vector<Real>,
    /// Direction and length of the sweep.
    pub delta: Vector<Real>,
    /// `1 / delta`, see [`inverse_delta`].
    pub invdelta: Vector<Real>,
    /// Half-extents of the swept box.
    pub extents: Vector<Real>,
    /// Are the extents zero?
    pub isray: bool,
}

impl TraceInfo {
    /// The uncentered start position of this trace.
    #[inline]
    pub fn start(&self) -> Point<Real> {
        self.startpos + self.startoffset
    }

    /// The uncentered end position of this trace.
    #[inline]
    pub fn end(&self) -> Point<Real> {
        self.start() + self.delta
    }
}

/// The mutable, intermediate and final results of a swept trace.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct TraceResults {
    /// Fraction of the sweep completed. `1.0` means nothing was hit.
    pub fraction: Real,
    /// Surface normal at impact.
    pub plane_normal: Vector<Real>,
    /// Texture info index of the hit brush side, `-1` if unknown.
    pub surface: i16,
    /// The initial position was in a solid area.
    pub startsolid: bool,
    /// The whole sweep was inside a solid area; the plane is not valid.
    pub allsolid: bool,
}

impl Default for TraceResults {
    fn default() -> Self {
        Self {
            fraction: 1.0,
            plane_normal: Vector::zeros(),
            surface: -1,
            startsolid: false,
            allsolid: false,
        }
    }
}

impl TraceResults {
    /// Did the trace hit anything?
    #[inline]
    pub fn did_hit(&self) -> bool {
        self.fraction < 1.0 || self.startsolid || self.allsolid
    }
}

/// A box (or point) moving along a straight segment, together with the earliest hit found
/// so far.
///
/// # Example
///
/// ```rust
/// use dzcoll3d::query::SweptTrace;
/// use nalgebra::{Point3, Vector3};
///
/// let trace = SweptTrace::new_hull(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(0.0, 0.0, -100.0),
///     Vector3::new(-16.0, -16.0, 0.0),
///     Vector3::new(16.0, 16.0, 72.0),
/// );
///
/// assert_eq!(trace.info.startpos, Point3::new(0.0, 0.0, 36.0));
/// assert_eq!(trace.info.extents, Vector3::new(16.0, 16.0, 36.0));
/// assert!(!trace.results.did_hit());
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct SweptTrace {
    /// The trace description. Never modified by queries.
    pub info: TraceInfo,
    /// The results, only ever improved by queries.
    pub results: TraceResults,
}

impl SweptTrace {
    /// A ray trace: a point moving from `start` to `end`.
    pub fn new_ray(start: Point<Real>, end: Point<Real>) -> Self {
        let delta = end - start;
        Self::from_info(TraceInfo {
            startpos: start,
            startoffset: Vector::zeros(),
            delta,
            invdelta: inverse_delta(&delta),
            extents: Vector::zeros(),
            isray: true,
        })
    }

    /// A hull trace: the box `[mins, maxs]` (relative to the moving position) moving from
    /// `start` to `end`.
    ///
    /// The stored start is re-centered on the box center; `info.startoffset` brings it back.
    pub fn new_hull(
        start: Point<Real>,
        end: Point<Real>,
        mins: Vector<Real>,
        maxs: Vector<Real>,
    ) -> Self {
        let delta = end - start;
        let extents = (maxs - mins) * 0.5;
        Self::from_info(TraceInfo {
            startpos: start + 0.5 * (mins + maxs),
            startoffset: -0.5 * (mins + maxs),
            delta,
            invdelta: inverse_delta(&delta),
            extents,
            isray: extents == Vector::zeros(),
        })
    }

    /// A fresh trace sharing another trace's description.
    pub fn from_info(info: TraceInfo) -> Self {
        Self {
            info,
            results: TraceResults::default(),
        }
    }

    /// Entry fraction of the full sweep (ignoring the current results) into the box
    /// `[mins, maxs]`, if any.
    #[inline]
    pub fn hits_aabb_on_full_sweep(&self, mins: &Point<Real>, maxs: &Point<Real>) -> Option<Real> {
        swept_box_hits_aabb(
            &self.info.startpos,
            &self.info.invdelta,
            &self.info.extents,
            mins,
            maxs,
        )
    }
}
