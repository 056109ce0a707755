//! Swept trace queries.
//!
//! A [`SweptTrace`] describes a box (or a point) moving along a straight segment. Every
//! narrow-phase routine of this crate takes a trace and improves its [`TraceResults`] when it
//! finds an earlier hit. The convex clipping shared by brushes, func brushes and props lives in
//! [`details`].

pub use self::swept_trace::{
    inverse_delta, SweptTrace, TraceInfo, TraceResults, DIST_EPSILON, NEVER_UPDATED,
};
pub use self::trace_comparison::{compare_trace_results, FRACTION_DISTANCE_TOLERANCE};

mod clip;
mod swept_trace;
mod trace_comparison;

/// Building blocks of the narrow-phase routines.
pub mod details {
    pub use super::clip::*;
}
