use crate::math::Real;
use crate::query::{TraceInfo, TraceResults};

/// Maximum tolerated distance between two hit positions along the same sweep.
pub const FRACTION_DISTANCE_TOLERANCE: Real = 0.05;

/// Are the `tested` results (near) identical to the `reference` results of the same trace?
///
/// `startsolid`, `allsolid`, `surface` and `plane_normal` must match exactly. The fractions may
/// differ by up to [`FRACTION_DISTANCE_TOLERANCE`] units of distance along `info.delta`.
/// Every discrepancy is logged as a warning.
pub fn compare_trace_results(
    info: &TraceInfo,
    reference: &TraceResults,
    tested: &TraceResults,
) -> bool {
    let mut identical = true;

    if reference.startsolid != tested.startsolid {
        log::warn!(
            "Trace discrepancy: startsolid = {} != {}",
            tested.startsolid,
            reference.startsolid
        );
        identical = false;
    }
    if reference.allsolid != tested.allsolid {
        log::warn!(
            "Trace discrepancy: allsolid = {} != {}",
            tested.allsolid,
            reference.allsolid
        );
        identical = false;
    }
    if reference.surface != tested.surface {
        log::warn!(
            "Trace discrepancy: surface = {} != {}",
            tested.surface,
            reference.surface
        );
        identical = false;
    }
    if reference.plane_normal != tested.plane_normal {
        log::warn!(
            "Trace discrepancy: plane_normal = {:?} != {:?}",
            tested.plane_normal,
            reference.plane_normal
        );
        identical = false;
    }

    let delta_diff = (reference.fraction - tested.fraction).abs() * info.delta.norm();
    if !identical || delta_diff > FRACTION_DISTANCE_TOLERANCE {
        log::warn!(
            "Trace discrepancy: fraction = {} != {} (distance difference: {})",
            tested.fraction,
            reference.fraction,
            delta_diff
        );
        identical = false;
    }

    identical
}
