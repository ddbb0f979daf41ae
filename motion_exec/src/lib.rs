//! # Motion control library.
//!
//! This library allows other crates in the workspace, and the unit tests, to access the items
//! defined inside the motion control executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Kinematic bounds - pure clamping of raw joint targets into the admissible box and corridor
pub mod kin_bounds;

/// Motion control module - converts discrete motion commands into bounded joint targets and
/// blocks until the mechanism converges
pub mod motion_ctrl;

/// Linear drift control module - dispatches a scalar drift position onto the linear actuator bank
pub mod drift_ctrl;

/// Self test - drives the mechanism through a randomised primitive sequence at several drift
/// levels
pub mod self_test;
