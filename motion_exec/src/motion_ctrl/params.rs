//! # Motion control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// Internal
use mech_if::cmd::PrimitiveMode;
use mech_if::eqpt::servo::NUM_JOINTS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Clone, Deserialize, Default)]
pub struct Params {
    /// Bus ids of the joint servos, joint 1 first.
    pub servo_ids: [usize; NUM_JOINTS],

    /// Mid angle of each joint, the centre of its admissible box.
    ///
    /// Units: radians
    pub theta_mid_rad: [f64; NUM_JOINTS],

    /// Full width of the admissible angle box, shared by both joints.
    ///
    /// Units: radians
    pub theta_range_rad: f64,

    /// Maximum admissible difference between the two joint angles.
    ///
    /// Units: radians
    pub theta_diff_max_rad: f64,

    /// Convergence threshold on each joint's absolute position error.
    ///
    /// Units: radians
    pub err_thresh_rad: f64,

    /// Sleep between convergence poll cycles.
    ///
    /// Units: milliseconds
    pub poll_interval_ms: u64,

    /// Overall timeout on a blocking move. Absent means block forever.
    ///
    /// Units: seconds
    pub move_timeout_s: Option<f64>,

    /// Default magnitude of a delta mode primitive.
    ///
    /// Units: radians
    pub primitive_mag_rad: f64,

    /// Default primitive mode.
    pub primitive_mode: PrimitiveMode,

    /// Rescale factor pulling scaled mode targets towards the joint mids,
    /// must be in (0, 1].
    pub primitive_scale: f64,

    /// Settle time after each primitive.
    ///
    /// Units: milliseconds
    pub primitive_settle_ms: u64,

    /// Settle time after a reset.
    ///
    /// Units: milliseconds
    pub reset_settle_ms: u64,

    /// Path to the drift control parameter file.
    pub drift_params_path: String,
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("The joint angle range {0} rad is not positive")]
    NonPositiveAngleRange(f64),

    #[error("The joint differential limit {0} rad is not positive")]
    NonPositiveDiffLimit(f64),

    #[error("The convergence threshold {0} rad is not positive")]
    NonPositiveErrThresh(f64),

    #[error("The move timeout {0} s is not positive")]
    NonPositiveTimeout(f64),

    #[error("The primitive rescale factor {0} is outside (0, 1]")]
    InvalidPrimitiveScale(f64),

    #[error("Servo ids {0:?} are not unique")]
    NonUniqueServoIds([usize; NUM_JOINTS]),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(self.theta_range_rad > 0.0) {
            return Err(ParamsError::NonPositiveAngleRange(self.theta_range_rad));
        }

        if !(self.theta_diff_max_rad > 0.0) {
            return Err(ParamsError::NonPositiveDiffLimit(self.theta_diff_max_rad));
        }

        if !(self.err_thresh_rad > 0.0) {
            return Err(ParamsError::NonPositiveErrThresh(self.err_thresh_rad));
        }

        if let Some(timeout_s) = self.move_timeout_s {
            if !(timeout_s > 0.0) {
                return Err(ParamsError::NonPositiveTimeout(timeout_s));
            }
        }

        if !(self.primitive_scale > 0.0 && self.primitive_scale <= 1.0) {
            return Err(ParamsError::InvalidPrimitiveScale(self.primitive_scale));
        }

        if self.servo_ids[0] == self.servo_ids[1] {
            return Err(ParamsError::NonUniqueServoIds(self.servo_ids));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
