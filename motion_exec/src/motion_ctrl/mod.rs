//! Motion control module
//!
//! Converts discrete motion commands into bounded joint angle targets for
//! the two actuated joints of the five bar mechanism, dispatches those
//! targets to the servo bank and blocks until the mechanism has converged
//! on them.
//!
//! All blocking waits poll the servo positions at a fixed interval and exit
//! once both joint errors are within the convergence threshold. With no
//! timeout configured a move against a stalled mechanism blocks forever, so
//! callers that need bounded latency must set one.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod primitives;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use primitives::*;
pub use state::*;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use mech_if::eqpt::servo::NUM_JOINTS;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MotionCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum MotionCtrlError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Parameters are invalid: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("Primitive id {0} is outside the primitive table")]
    PrimitiveIdOutOfRange(usize),

    #[error(
        "The mechanism failed to converge within {elapsed_s:.3} s \
        (joint errors {err_rad:?} rad)"
    )]
    ConvergenceTimeout {
        elapsed_s: f64,
        err_rad: [f64; NUM_JOINTS],
    },

    #[error("Trajectory step {step} failed: {source}")]
    TrajectoryStepFailed {
        step: usize,
        source: Box<MotionCtrlError>,
    },

    #[error("The servo bank reported a fault: {0}")]
    ServoError(#[from] mech_if::eqpt::servo::ServoBankError),

    #[error("Drift control error: {0}")]
    DriftError(#[from] super::drift_ctrl::DriftCtrlError),

    #[error("Could not initialise the archives: {0}")]
    ArchInitError(String),
}
