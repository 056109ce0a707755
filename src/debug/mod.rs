//! Observation of the collision procedure, for debug visualizations.
//!
//! Queries report their progress to a [`TraceObserver`]. [`NoopObserver`] discards everything
//! and compiles away, [`RecordingObserver`] keeps a history of the last traces.

pub use self::recording_observer::{
    BroadphaseLeafHit, DispLeafHit, ObserverUsageError, RecordingObserver, TraceRecord,
    MAX_TRACE_HISTORY_LEN,
};
pub use self::trace_observer::{NoopObserver, TraceObserver};

mod recording_observer;
mod trace_observer;
