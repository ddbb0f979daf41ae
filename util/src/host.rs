//! Host environment utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable giving the root of the software installation.
pub const SW_ROOT_ENV_VAR: &str = "FIVEBAR_SW_ROOT";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Error raised when the software root cannot be determined.
#[derive(Debug, Error)]
#[error("The software root environment variable (FIVEBAR_SW_ROOT) is not set")]
pub struct RootNotSet;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the software installation.
///
/// The root is read from the `FIVEBAR_SW_ROOT` environment variable and is
/// the directory containing the `params` and `sessions` directories.
pub fn get_fivebar_sw_root() -> Result<PathBuf, RootNotSet> {
    match env::var(SW_ROOT_ENV_VAR) {
        Ok(p) => Ok(PathBuf::from(p)),
        Err(_) => Err(RootNotSet),
    }
}
