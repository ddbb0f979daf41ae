//! # Linear actuator bank facade
//!
//! The auxiliary linear actuator bank holds the mechanism's base plate. It is commanded as a
//! fixed-width vector of channel positions, dispatched in one call.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of channels in the linear actuator bank
pub const NUM_LINEAR_CHANNELS: usize = 12;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A bank of linear actuators commanded as a single joint vector.
pub trait LinearBank {
    /// Command all channels to the given positions.
    ///
    /// `speed_factor` scales the driver's motion speed and must lie in `(0, 1]`.
    ///
    /// Units: metres
    fn set_joint_vector(
        &mut self,
        targets_m: &[f64; NUM_LINEAR_CHANNELS],
        speed_factor: f64,
    ) -> Result<(), LinearBankError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in a linear actuator bank.
#[derive(Debug, Error)]
pub enum LinearBankError {
    #[error("Speed factor {0} is outside (0, 1]")]
    InvalidSpeedFactor(f64),

    #[error("The linear actuator driver reported a fault: {0}")]
    DriverFault(String),
}
