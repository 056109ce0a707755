//! Axis Aligned Bounding Box.

use crate::bounding_volume::BoundingVolume;
use crate::math::{Point, Real, Vector, DIM};
use na;

/// An Axis-Aligned Bounding Box (AABB).
///
/// - **mins**: The point with the smallest coordinates on each axis.
/// - **maxs**: The point with the largest coordinates on each axis.
///
/// A box where `mins[i] > maxs[i]` for some axis is considered empty, see
/// [`Aabb::new_invalid`] which is the neutral element of [`BoundingVolume::merge`].
///
/// # Example
///
/// ```rust
/// use dzcoll3d::bounding_volume::{Aabb, BoundingVolume};
/// use nalgebra::Point3;
///
/// let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(64.0, 64.0, 64.0));
/// let b = Aabb::new(Point3::new(64.0, 0.0, 0.0), Point3::new(128.0, 64.0, 64.0));
///
/// // Touching boxes overlap.
/// assert!(a.intersects(&b));
/// assert_eq!(a.merged(&b).maxs, Point3::new(128.0, 64.0, 64.0));
/// ```
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Copy, Clone)]
#[repr(C)]
pub struct Aabb {
    /// The point with minimum coordinates.
    pub mins: Point<Real>,
    /// The point with maximum coordinates.
    pub maxs: Point<Real>,
}

impl Aabb {
    /// Creates a new AABB.
    ///
    /// # Arguments:
    ///   * `mins` - position of the point with the smallest coordinates.
    ///   * `maxs` - position of the point with the highest coordinates. Each component of `mins`
    ///     must be smaller than the related components of `maxs`.
    #[inline]
    pub fn new(mins: Point<Real>, maxs: Point<Real>) -> Aabb {
        Aabb { mins, maxs }
    }

    /// An invalid `Aabb` with `mins` set to `Real::MAX` and `maxs` set to `-Real::MAX`.
    ///
    /// This is often used as the initial values of some `Aabb` merging algorithms.
    #[inline]
    pub fn new_invalid() -> Self {
        Self::new(
            Vector::repeat(Real::MAX).into(),
            Vector::repeat(-Real::MAX).into(),
        )
    }

    /// Creates a new `Aabb` from its center and its half-extents.
    #[inline]
    pub fn from_half_extents(center: Point<Real>, half_extents: Vector<Real>) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Creates a new `Aabb` enclosing a set of points.
    ///
    /// Returns [`Aabb::new_invalid`] if the iterator is empty.
    pub fn from_points<I>(pts: I) -> Self
    where
        I: IntoIterator<Item = Point<Real>>,
    {
        let mut result = Self::new_invalid();
        for pt in pts {
            result.take_point(pt);
        }
        result
    }

    /// The center of this `Aabb`.
    #[inline]
    pub fn center(&self) -> Point<Real> {
        na::center(&self.mins, &self.maxs)
    }

    /// The half extents of this `Aabb`.
    #[inline]
    pub fn half_extents(&self) -> Vector<Real> {
        (self.maxs - self.mins) * 0.5
    }

    /// The extents of this `Aabb`.
    #[inline]
    pub fn extents(&self) -> Vector<Real> {
        self.maxs - self.mins
    }

    /// The total surface area of this `Aabb`.
    pub fn surface_area(&self) -> Real {
        let e = self.extents();
        2.0 * (e.x * e.z + e.x * e.y + e.y * e.z)
    }

    /// Does `mins <= maxs` hold on every axis?
    #[inline]
    pub fn is_valid(&self) -> bool {
        na::partial_le(&self.mins, &self.maxs)
    }

    /// Enlarges this `Aabb` so it also contains the point `pt`.
    pub fn take_point(&mut self, pt: Point<Real>) {
        self.mins = self.mins.coords.inf(&pt.coords).into();
        self.maxs = self.maxs.coords.sup(&pt.coords).into();
    }

    /// Tests if the given point is inside of this `Aabb`, boundary included.
    #[inline]
    pub fn contains_local_point(&self, point: &Point<Real>) -> bool {
        for i in 0..DIM {
            if point[i] < self.mins[i] || point[i] > self.maxs[i] {
                return false;
            }
        }

        true
    }

    /// Computes the time of impact of a box moving along a full sweep against this `Aabb`.
    ///
    /// See [`swept_box_hits_aabb`].
    #[inline]
    pub fn swept_box_hit(
        &self,
        start: &Point<Real>,
        inv_delta: &Vector<Real>,
        extents: &Vector<Real>,
    ) -> Option<Real> {
        swept_box_hits_aabb(start, inv_delta, extents, &self.mins, &self.maxs)
    }
}

/// Do the two boxes `(mins0, maxs0)` and `(mins1, maxs1)` overlap?
///
/// Touching boxes are considered overlapping.
#[inline]
pub fn aabb_intersects_aabb(
    mins0: &Point<Real>,
    maxs0: &Point<Real>,
    mins1: &Point<Real>,
    maxs1: &Point<Real>,
) -> bool {
    let inter_mins = mins0.coords.sup(&mins1.coords);
    let inter_maxs = maxs0.coords.inf(&maxs1.coords);

    inter_mins.x <= inter_maxs.x && inter_mins.y <= inter_maxs.y && inter_mins.z <= inter_maxs.z
}

/// Slab test of a box of half-extents `extents`, centered at `start` and moving along
/// `1 / inv_delta`, against the box `(mins, maxs)`.
///
/// The target box is expanded by `extents` so the moving box reduces to a point. Returns the
/// entry fraction, clamped to `[0, 1]`, if the full sweep touches the box.
///
/// A zero direction component must map to an inverse of `Real::MAX`, not infinity
/// (see [`crate::query::inverse_delta`]).
#[inline]
pub fn swept_box_hits_aabb(
    start: &Point<Real>,
    inv_delta: &Vector<Real>,
    extents: &Vector<Real>,
    mins: &Point<Real>,
    maxs: &Point<Real>,
) -> Option<Real> {
    let hit_mins = ((mins - start) - extents).component_mul(inv_delta);
    let hit_maxs = ((maxs - start) + extents).component_mul(inv_delta);

    let mut entry = hit_mins.x.min(hit_maxs.x);
    entry = entry.max(hit_mins.y.min(hit_maxs.y));
    entry = entry.max(hit_mins.z.min(hit_maxs.z));

    let mut exit = hit_mins.x.max(hit_maxs.x);
    exit = exit.min(hit_mins.y.max(hit_maxs.y));
    exit = exit.min(hit_mins.z.max(hit_maxs.z));

    entry = entry.max(0.0);
    exit = exit.min(1.0);

    if entry <= exit {
        Some(entry)
    } else {
        None
    }
}

impl BoundingVolume for Aabb {
    #[inline]
    fn center(&self) -> Point<Real> {
        self.center()
    }

    #[inline]
    fn intersects(&self, other: &Aabb) -> bool {
        aabb_intersects_aabb(&self.mins, &self.maxs, &other.mins, &other.maxs)
    }

    #[inline]
    fn contains(&self, other: &Aabb) -> bool {
        na::partial_le(&self.mins, &other.mins) && na::partial_ge(&self.maxs, &other.maxs)
    }

    #[inline]
    fn merge(&mut self, other: &Aabb) {
        self.mins = self.mins.inf(&other.mins);
        self.maxs = self.maxs.sup(&other.maxs);
    }

    #[inline]
    fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            mins: self.mins.inf(&other.mins),
            maxs: self.maxs.sup(&other.maxs),
        }
    }

    #[inline]
    fn loosen(&mut self, amount: Real) {
        assert!(amount >= 0.0, "The loosening margin must be positive.");
        self.mins += Vector::repeat(-amount);
        self.maxs += Vector::repeat(amount);
    }

    #[inline]
    fn loosened(&self, amount: Real) -> Aabb {
        assert!(amount >= 0.0, "The loosening margin must be positive.");
        Aabb {
            mins: self.mins + Vector::repeat(-amount),
            maxs: self.maxs + Vector::repeat(amount),
        }
    }
}
