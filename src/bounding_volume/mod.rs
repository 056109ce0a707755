//! Bounding volumes.

#[doc(inline)]
pub use crate::bounding_volume::aabb::{aabb_intersects_aabb, swept_box_hits_aabb, Aabb};
#[doc(inline)]
pub use crate::bounding_volume::bounding_volume::BoundingVolume;

#[doc(hidden)]
pub mod aabb;
#[doc(hidden)]
pub mod bounding_volume;
