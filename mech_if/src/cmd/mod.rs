//! # Motion command module
//!
//! This module defines the commands accepted by the motion controller. Commands are serialised
//! as JSON objects tagged by a `cmd` key, for example:
//!
//! ```text
//! {"cmd": "move_abs", "pos1_rad": 3.5, "pos2_rad": 2.8}
//! {"cmd": "primitive", "id": 4}
//! {"cmd": "reset"}
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command to the motion controller.
///
/// Each command is executed to completion, including the convergence poll on the mechanism,
/// before the next one is started.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum MotionCmd {
    /// Move both joints to an absolute target angle.
    ///
    /// Units: radians
    MoveAbs { pos1_rad: f64, pos2_rad: f64 },

    /// Move both joints by a delta from the current position.
    ///
    /// Units: radians
    MoveDelta { delta1_rad: f64, delta2_rad: f64 },

    /// Execute a single motion primitive.
    ///
    /// `id` indexes the 3x3 primitive table. `mag_rad` and `mode` override the configured
    /// primitive magnitude and mode when present.
    Primitive {
        id: usize,
        mag_rad: Option<f64>,
        mode: Option<PrimitiveMode>,
    },

    /// Execute a sequence of motion primitives in order.
    Trajectory { ids: Vec<usize> },

    /// Set the drift position of the linear actuator bank.
    ///
    /// Units: metres
    Drift { pos_m: f64 },

    /// Return the mechanism to its mid pose and the drift to its minimum.
    Reset,
}

/// Selects how a primitive id is turned into a joint target.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveMode {
    /// The table holds joint deltas about the current position.
    Delta,

    /// The table holds absolute targets, rescaled towards the joint mids.
    Scaled,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum MotionCmdParseError {
    #[error("Command contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionCmd {
    /// Parse a new command from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, MotionCmdParseError> {
        serde_json::from_str(json_str).map_err(MotionCmdParseError::InvalidJson)
    }
}

impl Default for PrimitiveMode {
    fn default() -> Self {
        PrimitiveMode::Delta
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
