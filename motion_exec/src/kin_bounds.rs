//! Kinematic bounds for the five-bar mechanism
//!
//! Pure functions which take raw joint angle targets and produce targets
//! the mechanism can safely be commanded to. No state, no I/O.
//!
//! Two clamps apply in a fixed order: the absolute per-joint box first,
//! then the differential corridor centred on the mean of the box-clamped
//! pair. The order is load-bearing: clamping the differential first gives
//! different results, and the composition is not iterated to a fixed
//! point. The corridor is applied last, so at extreme targets it takes
//! precedence over the box.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use mech_if::eqpt::servo::NUM_JOINTS;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The admissible joint angle region of the mechanism.
///
/// Immutable once constructed. The per-joint box is derived from the joint
/// mid angles and a shared full range, `min = mid - range/2` and
/// `max = mid + range/2`. The mids are biased off pi by an equal and
/// opposite fraction of a turn, so the box is asymmetric about the shared
/// geometric centre.
#[derive(Clone, Debug)]
pub struct AngleBounds {
    /// Mid angle of each joint.
    ///
    /// Units: radians
    theta_mid_rad: [f64; NUM_JOINTS],

    /// Minimum angle of each joint.
    ///
    /// Units: radians
    theta_min_rad: [f64; NUM_JOINTS],

    /// Maximum angle of each joint.
    ///
    /// Units: radians
    theta_max_rad: [f64; NUM_JOINTS],

    /// Maximum admissible difference between the two joint angles.
    ///
    /// Units: radians
    theta_diff_max_rad: f64,
}

/// Report of which clamps modified a raw target.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct BoundReport {
    /// True where the absolute box clamp moved the raw value
    pub abs_limited: [bool; NUM_JOINTS],

    /// True where the differential corridor clamp moved the box-clamped value
    pub diff_limited: [bool; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AngleBounds {
    /// Build the bounds from the joint mids, the shared full range and the
    /// differential limit.
    pub fn new(
        theta_mid_rad: [f64; NUM_JOINTS],
        theta_range_rad: f64,
        theta_diff_max_rad: f64,
    ) -> Self {
        let mut theta_min_rad = [0.0; NUM_JOINTS];
        let mut theta_max_rad = [0.0; NUM_JOINTS];

        for i in 0..NUM_JOINTS {
            theta_min_rad[i] = theta_mid_rad[i] - theta_range_rad / 2.0;
            theta_max_rad[i] = theta_mid_rad[i] + theta_range_rad / 2.0;
        }

        Self {
            theta_mid_rad,
            theta_min_rad,
            theta_max_rad,
            theta_diff_max_rad,
        }
    }

    /// Get the mid angle of each joint.
    ///
    /// Units: radians
    pub fn mid_rad(&self) -> [f64; NUM_JOINTS] {
        self.theta_mid_rad
    }

    /// Get the minimum angle of each joint.
    ///
    /// Units: radians
    pub fn min_rad(&self) -> [f64; NUM_JOINTS] {
        self.theta_min_rad
    }

    /// Get the maximum angle of each joint.
    ///
    /// Units: radians
    pub fn max_rad(&self) -> [f64; NUM_JOINTS] {
        self.theta_max_rad
    }

    /// Clamp each coordinate independently into its own `[min, max]`.
    pub fn clamp_abs(&self, pos_rad: [f64; NUM_JOINTS]) -> ([f64; NUM_JOINTS], [bool; NUM_JOINTS]) {
        let mut out = [0.0; NUM_JOINTS];
        let mut limited = [false; NUM_JOINTS];

        for i in 0..NUM_JOINTS {
            out[i] = clamp(&pos_rad[i], &self.theta_min_rad[i], &self.theta_max_rad[i]);
            limited[i] = out[i] != pos_rad[i];
        }

        (out, limited)
    }

    /// Clamp each coordinate into the differential corridor centred on the
    /// mean of the input pair.
    pub fn clamp_diff(
        &self,
        pos_rad: [f64; NUM_JOINTS],
    ) -> ([f64; NUM_JOINTS], [bool; NUM_JOINTS]) {
        let mean = (pos_rad[0] + pos_rad[1]) / 2.0;
        let lower = mean - self.theta_diff_max_rad / 2.0;
        let upper = mean + self.theta_diff_max_rad / 2.0;

        let mut out = [0.0; NUM_JOINTS];
        let mut limited = [false; NUM_JOINTS];

        for i in 0..NUM_JOINTS {
            out[i] = clamp(&pos_rad[i], &lower, &upper);
            limited[i] = out[i] != pos_rad[i];
        }

        (out, limited)
    }

    /// Bound a raw target into the admissible region.
    ///
    /// Deterministic and total over all reals including infinities (the
    /// absolute clamp makes the corridor mean finite). NaN inputs pass
    /// through unchanged and are not meaningful targets.
    pub fn bound(&self, pos_rad: [f64; NUM_JOINTS]) -> ([f64; NUM_JOINTS], BoundReport) {
        let (boxed, abs_limited) = self.clamp_abs(pos_rad);
        let (bounded, diff_limited) = self.clamp_diff(boxed);

        (
            bounded,
            BoundReport {
                abs_limited,
                diff_limited,
            },
        )
    }
}

impl BoundReport {
    /// True if any clamp modified the raw target.
    pub fn any_limited(&self) -> bool {
        self.abs_limited.iter().any(|&l| l) || self.diff_limited.iter().any(|&l| l)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
