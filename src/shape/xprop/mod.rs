//! Static and dynamic props: shared collision models placed in the world with their own
//! origin, orientation and uniform scale.

pub use self::bevel_lut::{
    plane_equal, snap_vector, BevelCandidate, BevelPlaneLut, BevelPlanes, CandidateIndices,
};
pub use self::collision_cache::{CollisionCache, CollisionCacheError};
pub use self::xprop_trace::swept_trace_xprop;

mod bevel_lut;
mod collision_cache;
mod xprop_trace;
