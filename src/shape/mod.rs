//! Collidable geometry of a map.
//!
//! Every kind of geometry comes with a narrow-phase routine improving the results of a
//! [`SweptTrace`](crate::query::SweptTrace):
//!
//! - world brushes, see [`swept_trace_brush`],
//! - `func_brush` entities, see [`swept_trace_func_brush`],
//! - displacements, see [`DispCollTree`],
//! - static and dynamic props, see [`swept_trace_xprop`].

pub use self::brush::{
    swept_trace_brush, Brush, BrushCategory, BrushContents, BrushModel, BrushSide, BrushTables,
    Plane,
};
pub use self::collision_model::{
    cw_triangle_plane, CollisionModel, CollisionModelError, CollisionModelLibrary,
    SectionTriMesh, VertIdx,
};
pub use self::displacement::{DispCollTree, DispError, DispFlags, DispInfo, DispVert};
pub use self::func_brush::{swept_trace_func_brush, FuncBrush, FuncBrushSolidity, ModelRefError};
pub use self::xprop::{swept_trace_xprop, BevelPlaneLut, CollisionCache, CollisionCacheError};

pub mod brush;
pub mod collision_model;
pub mod displacement;
pub mod func_brush;
pub mod xprop;
