//! Linear drift control module
//!
//! Maps a single scalar "drift" position onto the 12 channel linear actuator
//! bank holding the mechanism's base plate. Only a contiguous span of
//! channels carries the drift value, all other channels rest at the
//! configured minimum.
//!
//! Unlike the motion controller, which clamps raw joint targets into range,
//! the drift controller rejects out of range positions outright.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during DriftCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum DriftCtrlError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Parameters are invalid: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("Drift position {pos_m} m is outside [{min_m} m, {max_m} m]")]
    PositionOutOfRange { pos_m: f64, min_m: f64, max_m: f64 },

    #[error("The linear actuator bank rejected the demand: {0}")]
    LinearError(#[from] mech_if::eqpt::linear::LinearBankError),

    #[error("Could not initialise the archives: {0}")]
    ArchInitError(String),
}
