//! # Servo bank facade
//!
//! The five-bar mechanism is driven by a bank of position-controlled servos, one per actuated
//! joint. This module defines the facade trait through which the motion controller commands
//! them. The facade owns the true physical state: the controller treats every position read as
//! authoritative and never buffers positions across calls.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of actuated joints in the five-bar mechanism
pub const NUM_JOINTS: usize = 2;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A bank of position-controlled servos.
///
/// All operations are synchronous and blocking. `read_position` is called from inside the
/// motion controller's convergence poll loop, so implementations should return promptly.
pub trait ServoBank {
    /// Open the bus connecting the driver to the servos.
    fn open(&mut self) -> Result<(), ServoBankError>;

    /// Command the given servos to the given target angles.
    ///
    /// `ids` and `dems_rad` must be the same length, `dems_rad[i]` being the demand for servo
    /// `ids[i]`.
    ///
    /// Units: radians
    fn set_target(&mut self, ids: &[usize], dems_rad: &[f64]) -> Result<(), ServoBankError>;

    /// Read the current position of the given servos.
    ///
    /// The returned vector is in the same order as `ids`.
    ///
    /// Units: radians
    fn read_position(&mut self, ids: &[usize]) -> Result<Vec<f64>, ServoBankError>;

    /// Close the bus.
    fn close(&mut self) -> Result<(), ServoBankError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in a servo bank.
#[derive(Debug, Error)]
pub enum ServoBankError {
    #[error("The servo bus is not open")]
    BusNotOpen,

    #[error("Mismatched demand lengths: {num_ids} ids but {num_dems} demands")]
    MismatchedDemand { num_ids: usize, num_dems: usize },

    #[error("No servo with id {0} on the bus")]
    UnknownServo(usize),

    #[error("The servo driver reported a fault: {0}")]
    DriverFault(String),
}
