//! # Mechanism interface crate.
//!
//! Provides the actuator facade traits, the motion command definitions and the loopback
//! simulation equipment shared by the motion control software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Motion command definitions
pub mod cmd;

/// Actuator facade traits and simulation equipment
pub mod eqpt;
