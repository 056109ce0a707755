//! The collidable world: every collidable object of a map behind one BVH.
//!
//! A [`CollidableWorld`] is built from the [`MapGeometry`] of a parsed map and the collision
//! models of its props, then answers swept traces and displacement overlap queries.

pub use self::collidable_world::{CollidableWorld, PropCollision, WorldBuildOptions};
pub use self::map_geometry::{DynamicProp, MapGeometry, StaticProp, SOLID_VPHYSICS};

mod collidable_world;
mod map_geometry;
mod world_queries;
