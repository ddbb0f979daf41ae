//! # Equipment module
//!
//! This module defines the facade traits through which the motion control software drives
//! physical actuators, together with loopback simulation equipment implementing those traits
//! in software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Position-controlled servo bank facade
pub mod servo;

/// Linear actuator bank facade
pub mod linear;

/// Loopback simulation equipment
pub mod sim;
