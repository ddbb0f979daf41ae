//! # Motion primitive table
//!
//! Nine primitives, one per combination of `{decrease, hold, increase}` on
//! each joint, ordered with joint 1 as the outer index. Id 4 is the
//! stationary primitive, which holds both joints in delta mode and targets
//! the mid pair in scaled mode.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use crate::kin_bounds::AngleBounds;
use mech_if::eqpt::servo::NUM_JOINTS;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of primitives in the table.
pub const PRIMITIVE_COUNT: usize = 9;

/// Id of the primitive that commands no motion in delta mode.
pub const STATIONARY_ID: usize = 4;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the joint deltas of the given primitive in delta mode.
///
/// Returns `None` if `id` is outside the table.
pub fn delta(id: usize, mag_rad: f64) -> Option<[f64; NUM_JOINTS]> {
    let m = mag_rad;
    let table = [
        [-m, -m],
        [-m, 0.0],
        [-m, m],
        [0.0, -m],
        [0.0, 0.0],
        [0.0, m],
        [m, -m],
        [m, 0.0],
        [m, m],
    ];

    table.get(id).copied()
}

/// Get the raw absolute joint targets of the given primitive in scaled mode.
///
/// Each joint targets its box minimum, mid or maximum. The rescale towards
/// the mids is applied by the caller, not here.
///
/// Returns `None` if `id` is outside the table.
pub fn scaled_target(id: usize, bounds: &AngleBounds) -> Option<[f64; NUM_JOINTS]> {
    let min = bounds.min_rad();
    let mid = bounds.mid_rad();
    let max = bounds.max_rad();

    let table = [
        [min[0], min[1]],
        [min[0], mid[1]],
        [min[0], max[1]],
        [mid[0], min[1]],
        [mid[0], mid[1]],
        [mid[0], max[1]],
        [max[0], min[1]],
        [max[0], mid[1]],
        [max[0], max[1]],
    ];

    table.get(id).copied()
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn stationary_primitive_holds_both_joints() {
        assert_eq!(delta(STATIONARY_ID, 0.5), Some([0.0, 0.0]));
    }

    #[test]
    fn delta_table_spans_all_corners() {
        let m = 0.5;
        assert_eq!(delta(0, m), Some([-m, -m]));
        assert_eq!(delta(2, m), Some([-m, m]));
        assert_eq!(delta(6, m), Some([m, -m]));
        assert_eq!(delta(8, m), Some([m, m]));
    }

    #[test]
    fn joint_1_is_the_outer_index() {
        let m = 1.0;
        assert_eq!(delta(1, m), Some([-m, 0.0]));
        assert_eq!(delta(5, m), Some([0.0, m]));
    }

    #[test]
    fn out_of_range_id_is_none() {
        assert!(delta(PRIMITIVE_COUNT, 0.5).is_none());
        assert!(delta(usize::MAX, 0.5).is_none());
    }

    #[test]
    fn scaled_targets_come_from_the_box() {
        let bounds = AngleBounds::new([PI, PI], 1.0, 0.25);

        let min = bounds.min_rad();
        let mid = bounds.mid_rad();
        let max = bounds.max_rad();

        assert_eq!(scaled_target(0, &bounds), Some([min[0], min[1]]));
        assert_eq!(
            scaled_target(STATIONARY_ID, &bounds),
            Some([mid[0], mid[1]])
        );
        assert_eq!(scaled_target(8, &bounds), Some([max[0], max[1]]));
        assert_eq!(scaled_target(3, &bounds), Some([mid[0], min[1]]));
        assert!(scaled_target(PRIMITIVE_COUNT, &bounds).is_none());
    }
}
