use crate::math::{Point, Real};

/// A conservative volume around some geometry, cheap to test and to combine.
///
/// The BVH builds and queries its nodes through this trait only.
pub trait BoundingVolume {
    /// A point inside this volume, ideally its center.
    fn center(&self) -> Point<Real>;

    /// Do the two volumes overlap? Touching volumes do.
    fn intersects(&self, _: &Self) -> bool;

    /// Is `other` entirely inside this volume?
    fn contains(&self, other: &Self) -> bool;

    /// Grows this volume to also enclose `other`.
    fn merge(&mut self, other: &Self);

    /// The smallest volume enclosing both volumes.
    fn merged(&self, other: &Self) -> Self;

    /// Grows this volume by `amount` in every direction.
    fn loosen(&mut self, amount: Real);

    /// This volume grown by `amount` in every direction.
    fn loosened(&self, amount: Real) -> Self;
}
